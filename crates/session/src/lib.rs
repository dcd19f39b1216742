//! Upload session controller and driver for a chunked-upload endpoint.
//!
//! The controller is an explicit four-state machine (`Idle`,
//! `FileSelected`, `Uploading`, `Completed`) reacting to three external
//! events: file selected, chunk acknowledged, all chunks acknowledged.
//! The driver runs the incremental digest and the chunk transport
//! concurrently over the same file and joins both before issuing the
//! single finalization request carrying `upload_id` and `md5`.

mod controller;
mod error;
mod payload;
mod transport;
mod upload;

pub use controller::{UploadController, UploadEvent, UploadState};
pub use error::UploadError;
pub use payload::FormPayload;
pub use transport::ChunkTransport;
pub use upload::Uploader;
