//! Upload error types.

/// Errors produced while driving an upload session.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("digest error: {0}")]
    Digest(#[from] chunkup_digest::DigestError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("finalization failed: {0}")]
    Finalize(String),

    #[error("no upload session identifier captured")]
    MissingUploadId,

    #[error("invalid transition: {0}")]
    InvalidTransition(&'static str),

    #[error("task join error: {0}")]
    Task(String),

    #[error("cancelled")]
    Cancelled,
}
