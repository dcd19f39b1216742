use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata of the file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
}

/// Response returned by the endpoint after each accepted chunk.
///
/// The session identifier is present on every chunk response; the client
/// captures it from the first one only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkResponse {
    pub upload_id: String,
    /// Byte offset the server expects next.
    pub offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

/// Body of the single finalization POST.
///
/// Flat map of form fields: the seeded fields (authenticity token and any
/// other form values) plus `upload_id` and `md5`, each present exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeRequest {
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl FinalizeRequest {
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    /// Returns the value of a form field, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Response to the finalization POST.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeResponse {
    #[serde(default)]
    pub message: String,
}
