use std::fmt;

use serde::{Deserialize, Serialize};

/// Characters are keyed by random UUIDs.
pub type CharacterId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque handle to a stored blob.
///
/// Wraps the logical path the blob was written under; the HTTP layer maps
/// it to a public URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobPointer(String);

impl BlobPointer {
    pub fn new(logical_path: impl Into<String>) -> Self {
        Self(logical_path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
