//! Character-level turntable loop built from the direction images.

use pixsynth_core::character::{Character, LoopArtifact};
use pixsynth_core::loop_encoder::SequencedFrame;
use pixsynth_core::naming::turntable_path;

use crate::context::GenerationContext;
use crate::error::PipelineError;
use crate::loops::encode_and_store;

/// Timing for a turntable loop. `None` fields fall back to the pipeline
/// config.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurntableOptions {
    pub frame_duration_ms: Option<u32>,
    pub loop_count: Option<u16>,
}

/// Encode the stored direction images in clockwise order, store the loop
/// and attach it as the character's `loop_artifact`.
pub async fn generate_turntable(
    ctx: &GenerationContext,
    character: &mut Character,
    options: TurntableOptions,
) -> Result<LoopArtifact, PipelineError> {
    let images = character.images_clockwise();
    if images.is_empty() {
        return Err(PipelineError::Validation(
            "Character has no images to build a loop from".into(),
        ));
    }

    let mut frames = Vec::with_capacity(images.len());
    for (position, image) in images.iter().enumerate() {
        let bytes = ctx.blobs.get(&image.pointer).await?;
        frames.push(SequencedFrame::from_bytes(position as u32, bytes));
    }

    let duration = options
        .frame_duration_ms
        .unwrap_or(ctx.config.loop_frame_duration_ms);
    let loop_count = options.loop_count.unwrap_or(ctx.config.loop_count);

    let (pointer, encoded) =
        encode_and_store(ctx, frames, duration, loop_count, &turntable_path(character.id)).await?;

    let artifact = LoopArtifact {
        pointer,
        frame_duration_ms: encoded.frame_duration_ms,
        loop_count: encoded.loop_count,
        frame_count: encoded.frame_count,
        created_at: chrono::Utc::now(),
    };
    character.loop_artifact = Some(artifact.clone());
    character.touch();
    ctx.repo.save(character).await?;

    tracing::info!(
        character_id = %character.id,
        frames = artifact.frame_count,
        "Turntable loop stored",
    );
    Ok(artifact)
}
