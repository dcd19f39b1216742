//! Chunk transport abstraction.
//!
//! The embedding application implements this trait on top of its HTTP
//! client. Using a trait keeps session logic decoupled from transport
//! internals (retries, chunk-size negotiation, headers) and testable with
//! mocks.

use std::future::Future;
use std::pin::Pin;

use chunkup_digest::Slice;
use chunkup_protocol::{ChunkResponse, FinalizeRequest, FinalizeResponse};

use crate::error::UploadError;

/// Abstract transport to the chunked-upload endpoint.
pub trait ChunkTransport: Send + Sync {
    /// Sends one chunk and waits for the server acknowledgement.
    ///
    /// `upload_id` is `None` for the first chunk; the server issues the
    /// identifier in its response and expects it on every later chunk.
    fn send_chunk(
        &self,
        upload_id: Option<&str>,
        slice: &Slice,
        total_size: u64,
    ) -> Pin<Box<dyn Future<Output = Result<ChunkResponse, UploadError>> + Send + '_>>;

    /// Issues the single finalization POST.
    fn finalize(
        &self,
        request: &FinalizeRequest,
    ) -> Pin<Box<dyn Future<Output = Result<FinalizeResponse, UploadError>> + Send + '_>>;
}
