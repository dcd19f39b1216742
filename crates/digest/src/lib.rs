//! Incremental MD5 digest over fixed-size file slices.
//!
//! A file of length `N` is visited as slices `[0,S), [S,2S), ..., [kS,N)`
//! in strictly increasing, contiguous order. Appending the slices to a
//! streaming accumulator yields the same digest as hashing the whole file
//! at once.

mod compute;
mod slice;
mod stream;

pub use compute::{compute_file_md5, compute_file_md5_with_cancel, digest_slices};
pub use slice::{Slice, SliceReader, slice_count, slice_len};
pub use stream::{StreamingMd5, md5_bytes, md5_file};

/// Errors produced while reading or digesting file slices.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file truncated during read: expected {expected} bytes at offset {offset}")]
    Truncated { offset: u64, expected: u64 },

    #[error("background read task failed: {0}")]
    Task(String),

    #[error("cancelled")]
    Cancelled,
}
