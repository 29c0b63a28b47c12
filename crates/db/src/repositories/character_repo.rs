//! Repository for the `characters` table.

use async_trait::async_trait;
use pixsynth_core::character::{Character, CharacterStatus};
use pixsynth_core::error::CoreError;
use pixsynth_core::ports::CharacterRepository;
use pixsynth_core::types::CharacterId;
use sqlx::PgPool;

use crate::models::character::{to_document, CharacterRow};

/// Column list shared across queries.
const COLUMNS: &str = "id, name, status, document, created_at, updated_at";

/// Postgres-backed character store.
pub struct CharacterRepo {
    pool: PgPool,
}

impl CharacterRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> CoreError {
    CoreError::Storage(format!("Database error: {e}"))
}

#[async_trait]
impl CharacterRepository for CharacterRepo {
    async fn load(&self, id: CharacterId) -> Result<Option<Character>, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM characters WHERE id = $1");
        let row = sqlx::query_as::<_, CharacterRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(CharacterRow::into_character).transpose()
    }

    async fn save(&self, character: &Character) -> Result<(), CoreError> {
        let document = to_document(character)?;
        sqlx::query(
            "INSERT INTO characters (id, name, status, document, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                status = EXCLUDED.status,
                document = EXCLUDED.document,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(character.id)
        .bind(&character.name)
        .bind(character.status.as_str())
        .bind(&document)
        .bind(character.created_at)
        .bind(character.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, id: CharacterId) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM characters WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_by_status(
        &self,
        status: CharacterStatus,
        limit: i64,
        skip: i64,
    ) -> Result<Vec<Character>, CoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM characters
             WHERE status = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, CharacterRow>(&query)
            .bind(status.as_str())
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(CharacterRow::into_character).collect()
    }

    async fn count_by_status(&self, status: CharacterStatus) -> Result<i64, CoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM characters WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }
}
