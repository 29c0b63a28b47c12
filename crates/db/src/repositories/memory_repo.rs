//! In-process character store used by tests and by local runs without
//! `DATABASE_URL`.
//!
//! Documents go through the same serialize/normalize path as the Postgres
//! repository, so a test against this store exercises the stored shape.

use std::collections::HashMap;

use async_trait::async_trait;
use pixsynth_core::character::{Character, CharacterStatus};
use pixsynth_core::error::CoreError;
use pixsynth_core::ports::CharacterRepository;
use pixsynth_core::types::CharacterId;
use tokio::sync::RwLock;

use crate::models::character::{to_document, CharacterRow};

#[derive(Default)]
pub struct MemoryCharacterRepo {
    rows: RwLock<HashMap<CharacterId, CharacterRow>>,
}

impl MemoryCharacterRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw document as if an older writer had stored it.
    pub async fn insert_raw(&self, row: CharacterRow) {
        self.rows.write().await.insert(row.id, row);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl CharacterRepository for MemoryCharacterRepo {
    async fn load(&self, id: CharacterId) -> Result<Option<Character>, CoreError> {
        let row = self.rows.read().await.get(&id).cloned();
        row.map(CharacterRow::into_character).transpose()
    }

    async fn save(&self, character: &Character) -> Result<(), CoreError> {
        let row = CharacterRow {
            id: character.id,
            name: character.name.clone(),
            status: character.status.to_string(),
            document: to_document(character)?,
            created_at: character.created_at,
            updated_at: character.updated_at,
        };
        self.rows.write().await.insert(row.id, row);
        Ok(())
    }

    async fn delete(&self, id: CharacterId) -> Result<bool, CoreError> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }

    async fn list_by_status(
        &self,
        status: CharacterStatus,
        limit: i64,
        skip: i64,
    ) -> Result<Vec<Character>, CoreError> {
        let mut rows: Vec<CharacterRow> = self
            .rows
            .read()
            .await
            .values()
            .filter(|r| r.status == status.as_str())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(CharacterRow::into_character)
            .collect()
    }

    async fn count_by_status(&self, status: CharacterStatus) -> Result<i64, CoreError> {
        let rows = self.rows.read().await;
        Ok(rows.values().filter(|r| r.status == status.as_str()).count() as i64)
    }
}
