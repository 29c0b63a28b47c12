//! Row model for the `characters` table.

use pixsynth_core::character::Character;
use pixsynth_core::error::CoreError;
use pixsynth_core::types::{CharacterId, Timestamp};
use serde_json::Value;
use sqlx::FromRow;

use crate::legacy::normalize_legacy_document;

/// A row from the `characters` table.
#[derive(Debug, Clone, FromRow)]
pub struct CharacterRow {
    pub id: CharacterId,
    pub name: String,
    pub status: String,
    pub document: Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CharacterRow {
    /// Rebuild the aggregate, upgrading legacy documents first.
    ///
    /// Columns are authoritative for the fields they duplicate, so a
    /// document missing them (older records) still loads.
    pub fn into_character(self) -> Result<Character, CoreError> {
        let mut doc = self.document;
        if normalize_legacy_document(&mut doc) {
            tracing::info!(character_id = %self.id, "Normalized legacy character document");
        }

        let obj = doc.as_object_mut().ok_or_else(|| {
            CoreError::Internal(format!("Character {} document is not an object", self.id))
        })?;
        obj.insert("id".into(), Value::String(self.id.to_string()));
        obj.insert("status".into(), Value::String(self.status));
        obj.entry("name")
            .or_insert_with(|| Value::String(self.name.clone()));
        obj.entry("input_params")
            .or_insert_with(|| serde_json::json!({ "name": self.name }));
        obj.entry("created_at")
            .or_insert_with(|| Value::String(self.created_at.to_rfc3339()));
        obj.entry("updated_at")
            .or_insert_with(|| Value::String(self.updated_at.to_rfc3339()));

        serde_json::from_value(doc).map_err(|e| {
            CoreError::Internal(format!("Character {} document is invalid: {e}", self.id))
        })
    }
}

/// Serialize an aggregate into its stored document.
pub fn to_document(character: &Character) -> Result<Value, CoreError> {
    serde_json::to_value(character)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize character: {e}")))
}
