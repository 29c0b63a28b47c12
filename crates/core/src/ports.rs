//! Persistence seams the pipeline depends on.
//!
//! Implementations live in the `db` and `storage` crates; the pipeline
//! only sees these traits.

use async_trait::async_trait;

use crate::character::{Character, CharacterStatus};
use crate::error::CoreError;
use crate::types::{BlobPointer, CharacterId};

/// Load/save contract for the character aggregate.
#[async_trait]
pub trait CharacterRepository: Send + Sync {
    async fn load(&self, id: CharacterId) -> Result<Option<Character>, CoreError>;

    /// Idempotent upsert of the whole aggregate.
    async fn save(&self, character: &Character) -> Result<(), CoreError>;

    /// Returns `true` if a record was removed.
    async fn delete(&self, id: CharacterId) -> Result<bool, CoreError>;

    /// Characters in `status`, newest first.
    async fn list_by_status(
        &self,
        status: CharacterStatus,
        limit: i64,
        skip: i64,
    ) -> Result<Vec<Character>, CoreError>;

    async fn count_by_status(&self, status: CharacterStatus) -> Result<i64, CoreError>;
}

/// Byte storage keyed by relative logical paths.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write (or overwrite) `bytes` at `logical_path`.
    async fn put(&self, bytes: &[u8], logical_path: &str) -> Result<BlobPointer, CoreError>;

    async fn get(&self, pointer: &BlobPointer) -> Result<Vec<u8>, CoreError>;

    /// Remove a single blob or everything under a path prefix. Returns
    /// `false` when nothing existed there.
    async fn delete(&self, logical_path: &str) -> Result<bool, CoreError>;
}
