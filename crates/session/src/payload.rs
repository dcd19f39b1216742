use std::collections::BTreeMap;

use chunkup_protocol::{MD5_FIELD, UPLOAD_ID_FIELD};

/// Form payload accumulated across one upload session.
///
/// Explicit key-value structure with three insertion points: seeding at
/// init, `upload_id` at first-chunk-done, `md5` at finalization. A key is
/// stored at most once; later inserts under the same key are rejected
/// rather than overwriting. Every accepted mutation bumps the revision.
#[derive(Debug, Clone, Default)]
pub struct FormPayload {
    fields: Vec<(String, String)>,
    revision: u64,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, refusing duplicates.
    ///
    /// Returns `false` (and leaves the payload untouched) if the key is
    /// already present.
    pub fn insert(&mut self, name: &str, value: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.fields.push((name.to_string(), value.to_string()));
        self.revision += 1;
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Stores the server-issued session identifier, at most once.
    pub fn set_upload_id(&mut self, upload_id: &str) -> bool {
        self.insert(UPLOAD_ID_FIELD, upload_id)
    }

    pub fn upload_id(&self) -> Option<&str> {
        self.get(UPLOAD_ID_FIELD)
    }

    /// Stores the final digest, at most once.
    pub fn set_digest(&mut self, md5: &str) -> bool {
        self.insert(MD5_FIELD, md5)
    }

    /// Number of accepted mutations so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Snapshot of the current fields as a flat map.
    pub fn to_fields(&self) -> BTreeMap<String, String> {
        self.fields.iter().cloned().collect()
    }
}
