//! Handlers for `/characters/{id}/animations`.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pixsynth_core::direction::Direction;
use pixsynth_core::poses::ActionType;
use pixsynth_core::types::{BlobPointer, CharacterId};
use pixsynth_pipeline::{AnimationMode, AnimationRequest, DescriptorSource, DEFAULT_FRAME_COUNT};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::optional_json;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::views::{CharacterView, FrameView};

#[derive(Debug, Default, Deserialize)]
pub struct AnimationBody {
    pub frame_count: Option<u32>,
    /// `reference` (default) or `prompt`.
    pub mode: Option<String>,
    /// Stored blob path to use when the character has no readable
    /// reference image.
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnimationResponse {
    pub action: ActionType,
    pub direction: Direction,
    pub frames: Vec<FrameView>,
    pub loop_url: Option<String>,
    /// The character had no stored identity descriptor.
    pub descriptor_reconstructed: bool,
    pub character: CharacterView,
}

fn parse_slot(action: &str, direction: &str) -> AppResult<(ActionType, Direction)> {
    Ok((action.parse()?, direction.parse()?))
}

/// POST /api/v1/characters/{id}/animations/{action}/directions/{direction}
pub async fn generate(
    State(state): State<AppState>,
    Path((id, action, direction)): Path<(CharacterId, String, String)>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<DataResponse<AnimationResponse>>)> {
    let (action, direction) = parse_slot(&action, &direction)?;
    let body: AnimationBody = optional_json(&body)?;
    let mode = match body.mode.as_deref() {
        Some(raw) => raw.parse::<AnimationMode>().map_err(AppError::BadRequest)?,
        None => AnimationMode::default(),
    };

    let request = AnimationRequest {
        action,
        direction,
        frame_count: body.frame_count.unwrap_or(DEFAULT_FRAME_COUNT),
        mode,
        reference_override: body.reference.map(BlobPointer::new),
    };
    let (character, outcome) = state.service.generate_animation(id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: AnimationResponse {
                action,
                direction,
                frames: outcome
                    .frames
                    .iter()
                    .map(|f| FrameView::new(f, &state.storage))
                    .collect(),
                loop_url: outcome
                    .loop_pointer
                    .as_ref()
                    .map(|p| state.storage.public_url(p)),
                descriptor_reconstructed: outcome.descriptor_source
                    == DescriptorSource::Reconstructed,
                character: CharacterView::new(&character, &state.storage),
            },
        }),
    ))
}

/// DELETE /api/v1/characters/{id}/animations/{action}
pub async fn delete(
    State(state): State<AppState>,
    Path((id, action)): Path<(CharacterId, String)>,
) -> AppResult<StatusCode> {
    let action: ActionType = action.parse()?;
    if state.service.delete_animation(id, action).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id, action.as_str()))
    }
}

/// DELETE /api/v1/characters/{id}/animations/{action}/directions/{direction}
pub async fn delete_direction(
    State(state): State<AppState>,
    Path((id, action, direction)): Path<(CharacterId, String, String)>,
) -> AppResult<StatusCode> {
    let (action, direction) = parse_slot(&action, &direction)?;
    if state
        .service
        .delete_animation_direction(id, action, direction)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id, action.as_str()))
    }
}

fn not_found(id: CharacterId, action: &str) -> AppError {
    AppError::Pipeline(pixsynth_pipeline::PipelineError::NotFound {
        entity: "Animation",
        id: format!("{id}/{action}"),
    })
}
