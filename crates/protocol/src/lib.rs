//! Wire types and constants for the chunked-upload endpoint.
//!
//! The endpoint speaks snake_case form fields (`upload_id`, `md5`), so
//! serde's default field naming applies throughout.

pub mod types;

pub use types::{ChunkResponse, FileMeta, FinalizeRequest, FinalizeResponse};

/// Maximum chunk size accepted by the endpoint: 50 MB.
///
/// Fixed by the server configuration, not negotiated.
pub const MAX_CHUNK_SIZE: usize = 50_000_000;

/// Form field carrying the server-issued session identifier.
pub const UPLOAD_ID_FIELD: &str = "upload_id";

/// Form field carrying the final hex digest of the whole file.
pub const MD5_FIELD: &str = "md5";
