use std::io::Read;
use std::path::Path;

use crate::DigestError;

/// Slice size actually used: 0 means the server's fixed maximum.
fn effective_slice_size(slice_size: u64) -> u64 {
    if slice_size == 0 {
        chunkup_protocol::MAX_CHUNK_SIZE as u64
    } else {
        slice_size
    }
}

/// Number of slices needed to cover `total` bytes at `slice_size` per slice.
///
/// A zero-length input has zero slices. A `slice_size` of 0 falls back to
/// [`chunkup_protocol::MAX_CHUNK_SIZE`], as in [`SliceReader::new`].
pub fn slice_count(total: u64, slice_size: u64) -> u64 {
    total.div_ceil(effective_slice_size(slice_size))
}

/// Length of slice `index`, or `None` past the end of the input.
///
/// The final slice may be shorter than `slice_size`; there is never a
/// trailing empty slice. A `slice_size` of 0 falls back to
/// [`chunkup_protocol::MAX_CHUNK_SIZE`], as in [`SliceReader::new`].
pub fn slice_len(total: u64, slice_size: u64, index: u64) -> Option<u64> {
    let slice_size = effective_slice_size(slice_size);
    let start = index.checked_mul(slice_size)?;
    if start >= total {
        return None;
    }
    Some(slice_size.min(total - start))
}

/// One contiguous byte range of the source file.
#[derive(Debug, Clone)]
pub struct Slice {
    /// 0-based slice index.
    pub index: u64,
    /// Byte offset within the file.
    pub offset: u64,
    /// Slice bytes, `slice_size` long except possibly the last.
    pub data: Vec<u8>,
}

/// Reads a file as fixed-size slices through a monotonically advancing
/// index cursor.
pub struct SliceReader {
    file: std::fs::File,
    slice_size: u64,
    total: u64,
    index: u64,
}

impl SliceReader {
    /// Opens `path` for slice-wise reading.
    ///
    /// If `slice_size` is 0, [`chunkup_protocol::MAX_CHUNK_SIZE`] is used.
    pub fn new(path: &Path, slice_size: u64) -> Result<Self, DigestError> {
        let file = std::fs::File::open(path)?;
        let total = file.metadata()?.len();
        let slice_size = effective_slice_size(slice_size);
        Ok(Self {
            file,
            slice_size,
            total,
            index: 0,
        })
    }

    /// Reads the next slice and advances the cursor. Returns `None` once
    /// every slice has been visited.
    pub fn next_slice(&mut self) -> Result<Option<Slice>, DigestError> {
        let Some(len) = slice_len(self.total, self.slice_size, self.index) else {
            return Ok(None);
        };
        let offset = self.index * self.slice_size;

        let mut data = vec![0u8; len as usize];
        self.file.read_exact(&mut data).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                DigestError::Truncated {
                    offset,
                    expected: len,
                }
            } else {
                DigestError::Io(e)
            }
        })?;

        let slice = Slice {
            index: self.index,
            offset,
            data,
        };
        self.index += 1;
        Ok(Some(slice))
    }

    /// Current slice index (number of slices already read).
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Total file size in bytes.
    pub fn total_size(&self) -> u64 {
        self.total
    }

    /// Total number of slices.
    pub fn slice_count(&self) -> u64 {
        slice_count(self.total, self.slice_size)
    }
}
