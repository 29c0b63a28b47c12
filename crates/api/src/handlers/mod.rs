pub mod animations;
pub mod characters;
pub mod gallery;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// Parse an optional JSON body; an empty body yields `T::default()`.
pub(crate) fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))
}
