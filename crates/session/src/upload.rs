//! Upload driver.
//!
//! Runs the incremental digest and the chunk transport concurrently over
//! the same file. Both read from the start, independently; finalization
//! joins the digest task explicitly before the request body is built, so
//! the digest is always final when `md5` is serialized.

use std::path::Path;

use chunkup_digest::SliceReader;
use chunkup_protocol::{FileMeta, FinalizeResponse};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::controller::UploadController;
use crate::error::UploadError;
use crate::transport::ChunkTransport;

/// Drives one upload through a [`ChunkTransport`].
pub struct Uploader<'a> {
    transport: &'a dyn ChunkTransport,
    cancel: CancellationToken,
    slice_size: u64,
}

impl<'a> Uploader<'a> {
    /// Creates an uploader using the server's fixed maximum chunk size.
    pub fn new(transport: &'a dyn ChunkTransport) -> Self {
        Self {
            transport,
            cancel: CancellationToken::new(),
            slice_size: chunkup_protocol::MAX_CHUNK_SIZE as u64,
        }
    }

    /// Overrides the slice size. A value of 0 keeps the default.
    pub fn with_slice_size(mut self, slice_size: u64) -> Self {
        if slice_size > 0 {
            self.slice_size = slice_size;
        }
        self
    }

    /// Returns a cancellation token for this upload.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the full upload of `path`.
    ///
    /// On any failure the controller records the error and emits a
    /// `Failed` event; nothing is retried.
    pub async fn run(
        &self,
        path: &Path,
        controller: &mut UploadController,
    ) -> Result<FinalizeResponse, UploadError> {
        match self.run_inner(path, controller).await {
            Ok(resp) => {
                controller.finished(&resp.message).await;
                Ok(resp)
            }
            Err(e) => {
                controller.fail(&e).await;
                Err(e)
            }
        }
    }

    async fn run_inner(
        &self,
        path: &Path,
        controller: &mut UploadController,
    ) -> Result<FinalizeResponse, UploadError> {
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        controller
            .select_file(FileMeta {
                name: name.clone(),
                size: metadata.len(),
            })
            .await;
        controller.begin()?;
        self.check_cancelled()?;

        info!(file = %name, size = metadata.len(), "upload started");

        // Digest and transport both read the file from the start,
        // unsynchronized while running. The digest observes a child token
        // so a failed or cancelled upload also stops the remaining reads.
        let digest_cancel = self.cancel.child_token();
        let digest_task = tokio::spawn({
            let path = path.to_path_buf();
            let slice_size = self.slice_size;
            let cancel = digest_cancel.clone();
            async move {
                chunkup_digest::compute_file_md5_with_cancel(&path, slice_size, cancel).await
            }
        });

        if let Err(e) = self.send_chunks(path, controller).await {
            digest_cancel.cancel();
            let _ = digest_task.await;
            return Err(e);
        }

        // Explicit join: the digest must be final before the body carrying
        // `md5` is built.
        let md5 = digest_task
            .await
            .map_err(|e| UploadError::Task(e.to_string()))??;

        let request = controller.complete(&md5)?;
        let resp = self.transport.finalize(&request).await?;
        info!(upload_id = request.get("upload_id").unwrap_or(""), "upload finalized");
        Ok(resp)
    }

    async fn send_chunks(
        &self,
        path: &Path,
        controller: &mut UploadController,
    ) -> Result<(), UploadError> {
        let mut reader = {
            let path = path.to_path_buf();
            let slice_size = self.slice_size;
            task::spawn_blocking(move || SliceReader::new(&path, slice_size))
                .await
                .map_err(|e| UploadError::Task(e.to_string()))??
        };
        let total = reader.total_size();
        let mut loaded: u64 = 0;

        loop {
            self.check_cancelled()?;

            let (r, slice) = task::spawn_blocking(move || {
                let slice = reader.next_slice();
                (reader, slice)
            })
            .await
            .map_err(|e| UploadError::Task(e.to_string()))?;
            reader = r;

            let Some(slice) = slice? else {
                break;
            };

            let upload_id = controller.payload().upload_id().map(str::to_string);
            let resp = self
                .transport
                .send_chunk(upload_id.as_deref(), &slice, total)
                .await?;

            loaded += slice.data.len() as u64;
            debug!(
                index = slice.index,
                offset = slice.offset,
                loaded,
                total,
                "chunk acknowledged"
            );
            controller.chunk_done(&resp, loaded, total).await?;
        }
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }
}
