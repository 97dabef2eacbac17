//! Key-value document stored in MongoDB.

use serde::{Deserialize, Serialize};

/// One entry of the flat key-value collection.
///
/// The value is kept as JSON text so the collection stays schema-free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvEntry {
    /// Store key, used as the document ID
    #[serde(rename = "_id")]
    pub key: String,

    /// JSON-encoded value
    pub value: String,

    /// Last write (unix seconds)
    #[serde(default)]
    pub updated_at: i64,
}

impl KvEntry {
    pub fn new(key: impl Into<String>, value: &serde_json::Value) -> serde_json::Result<Self> {
        Ok(Self {
            key: key.into(),
            value: serde_json::to_string(value)?,
            updated_at: chrono::Utc::now().timestamp(),
        })
    }

    /// Decode the stored JSON value.
    pub fn decode(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.value)
    }
}
