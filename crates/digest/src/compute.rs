use std::path::Path;

use tokio::task;
use tokio_util::sync::CancellationToken;

use crate::{DigestError, SliceReader, StreamingMd5};

/// Computes the MD5 of `path` by visiting fixed-size slices in order.
///
/// Exactly one slice read is outstanding at a time: the next read does not
/// begin until the previous append has completed, because the accumulator
/// state depends on append order. A read failure surfaces the error and
/// yields no digest, never a partial one.
pub async fn compute_file_md5(path: &Path, slice_size: u64) -> Result<String, DigestError> {
    compute_file_md5_with_cancel(path, slice_size, CancellationToken::new()).await
}

/// Like [`compute_file_md5`], but checks `cancel` between slices so a
/// caller can stop the remaining reads once the result is no longer
/// needed. Cancellation surfaces as [`DigestError::Cancelled`].
pub async fn compute_file_md5_with_cancel(
    path: &Path,
    slice_size: u64,
    cancel: CancellationToken,
) -> Result<String, DigestError> {
    let reader = {
        let path = path.to_path_buf();
        task::spawn_blocking(move || SliceReader::new(&path, slice_size))
            .await
            .map_err(|e| DigestError::Task(e.to_string()))??
    };
    digest_slices(reader, cancel).await
}

/// Digests every remaining slice of `reader` in order.
pub async fn digest_slices(
    mut reader: SliceReader,
    cancel: CancellationToken,
) -> Result<String, DigestError> {
    let mut acc = StreamingMd5::new();
    loop {
        if cancel.is_cancelled() {
            return Err(DigestError::Cancelled);
        }

        let (r, slice) = task::spawn_blocking(move || {
            let slice = reader.next_slice();
            (reader, slice)
        })
        .await
        .map_err(|e| DigestError::Task(e.to_string()))?;
        reader = r;

        match slice? {
            Some(slice) => acc.append(&slice.data),
            None => break,
        }
    }
    Ok(acc.finish())
}
