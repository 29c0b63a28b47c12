//! Handlers for the `/characters` resource.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pixsynth_core::character::Story;
use pixsynth_core::form::CharacterForm;
use pixsynth_core::types::CharacterId;
use pixsynth_pipeline::{PipelineError, TurntableOptions};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::optional_json;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::views::{CharacterView, LoopView, StatusView};

/// POST /api/v1/characters/generate
///
/// Runs the whole generation inside the request and answers with the
/// character in `pending_save`.
pub async fn generate(
    State(state): State<AppState>,
    Json(form): Json<CharacterForm>,
) -> AppResult<(StatusCode, Json<DataResponse<CharacterView>>)> {
    let character = state.service.generate_character(form).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CharacterView::new(&character, &state.storage),
        }),
    ))
}

/// GET /api/v1/characters/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<CharacterId>,
) -> AppResult<Json<DataResponse<CharacterView>>> {
    let character = state.service.get(id).await?;
    Ok(Json(DataResponse {
        data: CharacterView::new(&character, &state.storage),
    }))
}

/// GET /api/v1/characters/{id}/status
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<CharacterId>,
) -> AppResult<Json<DataResponse<StatusView>>> {
    let report = state.service.status(id).await?;
    Ok(Json(DataResponse {
        data: report.into(),
    }))
}

/// POST /api/v1/characters/{id}/save
pub async fn save(
    State(state): State<AppState>,
    Path(id): Path<CharacterId>,
) -> AppResult<Json<DataResponse<CharacterView>>> {
    let character = state.service.confirm_save(id).await?;
    Ok(Json(DataResponse {
        data: CharacterView::new(&character, &state.storage),
    }))
}

/// DELETE /api/v1/characters/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<CharacterId>,
) -> AppResult<StatusCode> {
    if state.service.delete_character(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Pipeline(PipelineError::character_not_found(id)))
    }
}

// ---------------------------------------------------------------------------
// Story
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    /// `false` when the provider failed and the previous story was kept.
    pub generated: bool,
    pub story: Option<Story>,
}

/// POST /api/v1/characters/{id}/story
pub async fn regenerate_story(
    State(state): State<AppState>,
    Path(id): Path<CharacterId>,
) -> AppResult<Json<DataResponse<StoryResponse>>> {
    let (character, fresh) = state.service.regenerate_story(id).await?;
    Ok(Json(DataResponse {
        data: StoryResponse {
            generated: fresh.is_some(),
            story: character.story,
        },
    }))
}

// ---------------------------------------------------------------------------
// Turntable loop
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct LoopRequest {
    pub frame_duration_ms: Option<u32>,
    pub loop_count: Option<u16>,
}

/// POST /api/v1/characters/{id}/gif
///
/// Body is optional: `{ "frame_duration_ms": 200, "loop_count": 0 }`.
pub async fn create_loop(
    State(state): State<AppState>,
    Path(id): Path<CharacterId>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<DataResponse<LoopView>>)> {
    let request: LoopRequest = optional_json(&body)?;
    if request.frame_duration_ms == Some(0) {
        return Err(AppError::BadRequest("frame_duration_ms must be positive".into()));
    }
    let (_, artifact) = state
        .service
        .generate_turntable(
            id,
            TurntableOptions {
                frame_duration_ms: request.frame_duration_ms,
                loop_count: request.loop_count,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: LoopView::new(&artifact, &state.storage),
        }),
    ))
}
