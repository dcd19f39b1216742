//! Session state machine.
//!
//! All session-scoped state (form payload, session identifier, progress)
//! lives in explicit fields here rather than in closure captures, and is
//! reset explicitly when a new file is selected.

use chunkup_protocol::{ChunkResponse, FileMeta, FinalizeRequest};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::UploadError;
use crate::payload::FormPayload;

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadState {
    Idle,
    FileSelected,
    Uploading,
    Completed,
}

/// Event emitted as a side effect of a state transition.
///
/// File name, file size and progress percentage are carried as event
/// fields for the embedding application to display.
#[derive(Debug, Clone, Serialize)]
pub enum UploadEvent {
    FileSelected { name: String, size: u64 },
    Progress { percent: u8 },
    Completed { message: String },
    Failed { error: String },
}

/// Upload session controller.
///
/// Reacts to the three external events of the protocol: file selected,
/// chunk acknowledged, all chunks acknowledged.
pub struct UploadController {
    state: UploadState,
    token_field: String,
    token: String,
    file: Option<FileMeta>,
    payload: FormPayload,
    percent: u8,
    error: Option<String>,
    events_tx: mpsc::Sender<UploadEvent>,
}

impl UploadController {
    /// Creates an idle controller seeded with the authenticity token.
    pub fn new(token_field: &str, token: &str, events_tx: mpsc::Sender<UploadEvent>) -> Self {
        let mut payload = FormPayload::new();
        payload.insert(token_field, token);
        Self {
            state: UploadState::Idle,
            token_field: token_field.to_string(),
            token: token.to_string(),
            file: None,
            payload,
            percent: 0,
            error: None,
            events_tx,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn file(&self) -> Option<&FileMeta> {
        self.file.as_ref()
    }

    pub fn payload(&self) -> &FormPayload {
        &self.payload
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Records the selected file and arms the upload.
    ///
    /// Allowed from any state: selecting a file begins a fresh session, so
    /// all session-scoped state is reset and the payload is reseeded with
    /// the token.
    pub async fn select_file(&mut self, meta: FileMeta) {
        self.payload = FormPayload::new();
        self.payload.insert(&self.token_field, &self.token);
        self.percent = 0;
        self.error = None;
        self.state = UploadState::FileSelected;

        debug!(file = %meta.name, size = meta.size, "file selected");
        self.emit(UploadEvent::FileSelected {
            name: meta.name.clone(),
            size: meta.size,
        })
        .await;
        self.file = Some(meta);
    }

    /// One-shot trigger: starts the upload.
    pub fn begin(&mut self) -> Result<(), UploadError> {
        if self.state != UploadState::FileSelected {
            return Err(UploadError::InvalidTransition(
                "upload trigger without a selected file",
            ));
        }
        self.state = UploadState::Uploading;
        Ok(())
    }

    /// Handles one chunk acknowledgement.
    ///
    /// The session identifier is captured from the first acknowledgement
    /// only; this event fires once per chunk, not once per upload.
    /// Progress is `floor(loaded / total * 100)`, clamped so it never
    /// decreases.
    pub async fn chunk_done(
        &mut self,
        resp: &ChunkResponse,
        bytes_loaded: u64,
        bytes_total: u64,
    ) -> Result<(), UploadError> {
        if self.state != UploadState::Uploading {
            return Err(UploadError::InvalidTransition(
                "chunk acknowledged while not uploading",
            ));
        }

        if self.payload.set_upload_id(&resp.upload_id) {
            debug!(upload_id = %resp.upload_id, "captured session identifier");
        }

        let raw = if bytes_total == 0 {
            100
        } else {
            ((bytes_loaded as u128 * 100) / bytes_total as u128).min(100) as u8
        };
        self.percent = self.percent.max(raw);
        self.emit(UploadEvent::Progress {
            percent: self.percent,
        })
        .await;
        Ok(())
    }

    /// Handles the all-chunks-done event: merges the form fields with the
    /// final digest and returns the finalization body.
    pub fn complete(&mut self, md5: &str) -> Result<FinalizeRequest, UploadError> {
        if self.state != UploadState::Uploading {
            return Err(UploadError::InvalidTransition(
                "completion while not uploading",
            ));
        }
        if self.payload.upload_id().is_none() {
            return Err(UploadError::MissingUploadId);
        }
        self.payload.set_digest(md5);
        self.state = UploadState::Completed;
        Ok(FinalizeRequest::new(self.payload.to_fields()))
    }

    /// Reports a successful finalization.
    pub async fn finished(&mut self, message: &str) {
        self.emit(UploadEvent::Completed {
            message: message.to_string(),
        })
        .await;
    }

    /// Records a failure. The state machine stays where it is; a new file
    /// selection starts the next session.
    pub async fn fail(&mut self, error: &UploadError) {
        let msg = error.to_string();
        self.error = Some(msg.clone());
        self.emit(UploadEvent::Failed { error: msg }).await;
    }

    async fn emit(&self, event: UploadEvent) {
        let _ = self.events_tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ack(upload_id: &str, offset: u64) -> ChunkResponse {
        ChunkResponse {
            upload_id: upload_id.to_string(),
            offset,
            expires: None,
        }
    }

    fn controller() -> (UploadController, mpsc::Receiver<UploadEvent>) {
        let (tx, rx) = mpsc::channel(64);
        (UploadController::new("csrfmiddlewaretoken", "tok", tx), rx)
    }

    async fn uploading_controller() -> (UploadController, mpsc::Receiver<UploadEvent>) {
        let (mut c, rx) = controller();
        c.select_file(FileMeta {
            name: "challenge.zip".into(),
            size: 100,
        })
        .await;
        c.begin().unwrap();
        (c, rx)
    }

    #[tokio::test]
    async fn starts_idle_with_seeded_token() {
        let (c, _rx) = controller();
        assert_eq!(c.state(), UploadState::Idle);
        assert_eq!(c.payload().get("csrfmiddlewaretoken"), Some("tok"));
        assert_eq!(c.percent(), 0);
    }

    #[tokio::test]
    async fn select_then_begin() {
        let (mut c, mut rx) = controller();
        c.select_file(FileMeta {
            name: "a.bin".into(),
            size: 10,
        })
        .await;
        assert_eq!(c.state(), UploadState::FileSelected);
        assert_eq!(c.file().unwrap().name, "a.bin");

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event,
            UploadEvent::FileSelected { ref name, size: 10 } if name == "a.bin"
        ));

        c.begin().unwrap();
        assert_eq!(c.state(), UploadState::Uploading);
    }

    #[tokio::test]
    async fn begin_without_file_is_rejected() {
        let (mut c, _rx) = controller();
        assert!(matches!(
            c.begin(),
            Err(UploadError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn session_identifier_captured_exactly_once() {
        let (mut c, _rx) = uploading_controller().await;

        // The chunk-done event fires once per chunk, not once per upload.
        c.chunk_done(&ack("first", 50), 50, 100).await.unwrap();
        c.chunk_done(&ack("second", 100), 100, 100).await.unwrap();
        c.chunk_done(&ack("third", 100), 100, 100).await.unwrap();

        assert_eq!(c.payload().upload_id(), Some("first"));
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_bounded() {
        let (mut c, mut rx) = uploading_controller().await;
        // Drain the FileSelected event.
        let _ = rx.recv().await.unwrap();

        c.chunk_done(&ack("u1", 33), 33, 100).await.unwrap();
        c.chunk_done(&ack("u1", 66), 66, 100).await.unwrap();
        // A stale, smaller loaded value must not move progress backwards.
        c.chunk_done(&ack("u1", 10), 10, 100).await.unwrap();
        c.chunk_done(&ack("u1", 100), 100, 100).await.unwrap();

        let mut last = 0u8;
        for _ in 0..4 {
            match rx.recv().await.unwrap() {
                UploadEvent::Progress { percent } => {
                    assert!(percent >= last);
                    assert!(percent <= 100);
                    last = percent;
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert_eq!(last, 100);
    }

    #[tokio::test]
    async fn progress_is_floored() {
        let (mut c, _rx) = uploading_controller().await;
        // 199 / 300 = 66.33..% -> 66.
        c.chunk_done(&ack("u1", 199), 199, 300).await.unwrap();
        assert_eq!(c.percent(), 66);
    }

    #[tokio::test]
    async fn chunk_done_outside_uploading_is_rejected() {
        let (mut c, _rx) = controller();
        let result = c.chunk_done(&ack("u1", 10), 10, 100).await;
        assert!(matches!(result, Err(UploadError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn complete_requires_session_identifier() {
        let (mut c, _rx) = uploading_controller().await;
        assert!(matches!(
            c.complete("d41d8cd98f00b204e9800998ecf8427e"),
            Err(UploadError::MissingUploadId)
        ));
    }

    #[tokio::test]
    async fn complete_builds_finalization_body() {
        let (mut c, _rx) = uploading_controller().await;
        c.chunk_done(&ack("u1", 100), 100, 100).await.unwrap();

        let req = c.complete("0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(c.state(), UploadState::Completed);
        assert_eq!(req.fields.len(), 3);
        assert_eq!(req.get("upload_id"), Some("u1"));
        assert_eq!(req.get("md5"), Some("0123456789abcdef0123456789abcdef"));
        assert_eq!(req.get("csrfmiddlewaretoken"), Some("tok"));
    }

    #[tokio::test]
    async fn new_file_selection_resets_session_state() {
        let (mut c, _rx) = uploading_controller().await;
        c.chunk_done(&ack("u1", 100), 100, 100).await.unwrap();
        c.complete("0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(c.state(), UploadState::Completed);

        c.select_file(FileMeta {
            name: "next.zip".into(),
            size: 5,
        })
        .await;
        assert_eq!(c.state(), UploadState::FileSelected);
        assert_eq!(c.percent(), 0);
        assert!(c.payload().upload_id().is_none());
        // Token reseeded, nothing else.
        assert_eq!(c.payload().len(), 1);
    }

    #[tokio::test]
    async fn fail_records_error_and_emits_event() {
        let (mut c, mut rx) = uploading_controller().await;
        let _ = rx.recv().await.unwrap(); // FileSelected

        c.fail(&UploadError::Transport("connection reset".into()))
            .await;
        assert!(c.error().unwrap().contains("connection reset"));
        assert!(matches!(
            rx.recv().await.unwrap(),
            UploadEvent::Failed { .. }
        ));
    }
}
