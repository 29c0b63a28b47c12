//! Animation frame generation for one action/direction slot.
//!
//! Two modes:
//!
//! - **Reference-guided**: one provider call returns the whole sequence,
//!   guided by the character's reference image with locked parameters.
//! - **Prompt-only**: one text-to-image call per frame, each with its own
//!   pose phrase.
//!
//! Nothing is written to the character until every frame is stored. If a
//! blob write or the save fails, the slot's previous blobs are written back,
//! so a failed run leaves both the record and its files as they were.

use std::fmt;
use std::str::FromStr;

use pixsynth_core::character::{AnimationFrame, Character};
use pixsynth_core::direction::{Direction, BASE_DIRECTION};
use pixsynth_core::loop_encoder::SequencedFrame;
use pixsynth_core::naming::{animation_frame_path, animation_loop_path};
use pixsynth_core::poses::{frame_descriptions, ActionType};
use pixsynth_core::prompts::{prompt_only_frame_prompt, reference_animation_prompt};
use pixsynth_core::retry::RetryPolicy;
use pixsynth_core::types::BlobPointer;
use pixsynth_gateway::{ImageRequest, SequenceRequest};

use crate::config::MAX_FRAME_COUNT;
use crate::context::GenerationContext;
use crate::descriptor::{resolve_descriptor, DescriptorSource};
use crate::error::PipelineError;
use crate::loops::encode_and_store;
use crate::retry::with_retry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationMode {
    #[default]
    ReferenceGuided,
    PromptOnly,
}

impl AnimationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReferenceGuided => "reference",
            Self::PromptOnly => "prompt",
        }
    }
}

impl fmt::Display for AnimationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reference" | "reference-guided" | "reference_guided" => Ok(Self::ReferenceGuided),
            "prompt" | "prompt-only" | "prompt_only" => Ok(Self::PromptOnly),
            other => Err(format!("Unknown animation mode: {other}")),
        }
    }
}

/// One animation slot to (re)generate.
#[derive(Debug, Clone)]
pub struct AnimationRequest {
    pub action: ActionType,
    pub direction: Direction,
    pub frame_count: u32,
    pub mode: AnimationMode,
    /// Reference to fall back to when the character has no usable one.
    pub reference_override: Option<BlobPointer>,
}

#[derive(Debug, Clone)]
pub struct AnimationOutcome {
    pub frames: Vec<AnimationFrame>,
    pub loop_pointer: Option<BlobPointer>,
    pub descriptor_source: DescriptorSource,
}

/// Generate and attach the frames for one slot, replacing whatever the slot
/// held before. The character is saved once, after all frames are stored.
pub async fn generate_animation(
    ctx: &GenerationContext,
    character: &mut Character,
    request: &AnimationRequest,
) -> Result<AnimationOutcome, PipelineError> {
    if request.frame_count == 0 || request.frame_count > MAX_FRAME_COUNT {
        return Err(PipelineError::Validation(format!(
            "frame_count must be between 1 and {MAX_FRAME_COUNT}, got {}",
            request.frame_count
        )));
    }

    let (descriptor, descriptor_source) = resolve_descriptor(character);

    tracing::info!(
        character_id = %character.id,
        action = %request.action,
        direction = %request.direction,
        frames = request.frame_count,
        mode = %request.mode,
        "Generating animation",
    );

    let raw_frames = match request.mode {
        AnimationMode::ReferenceGuided => {
            reference_guided_frames(ctx, character, request, &descriptor).await?
        }
        AnimationMode::PromptOnly => prompt_only_frames(ctx, character, request, &descriptor).await?,
    };

    let id = character.id;
    let snapshot = SlotSnapshot::capture(ctx, character, request.action, request.direction).await;
    let mut written = Vec::new();
    let (frames, loop_pointer) =
        match commit_slot(ctx, character, request, raw_frames, &mut written).await {
            Ok(committed) => committed,
            Err(e) => {
                tracing::warn!(
                    character_id = %id,
                    action = %request.action,
                    direction = %request.direction,
                    error = %e,
                    "Animation run failed, restoring previous slot",
                );
                snapshot.restore(ctx, &written).await;
                return Err(e);
            }
        };

    // Frames and loops from the previous run that nothing points to anymore.
    snapshot.discard_unreferenced(ctx, &frames).await;

    tracing::info!(
        character_id = %id,
        action = %request.action,
        direction = %request.direction,
        frames = frames.len(),
        "Animation stored",
    );

    Ok(AnimationOutcome {
        frames,
        loop_pointer,
        descriptor_source,
    })
}

/// Writes the frames and loop of one slot, then saves the character. Every
/// blob written is pushed to `written` so a failure can be rolled back.
/// `character` is only replaced once the save succeeded.
async fn commit_slot(
    ctx: &GenerationContext,
    character: &mut Character,
    request: &AnimationRequest,
    raw_frames: Vec<Vec<u8>>,
    written: &mut Vec<BlobPointer>,
) -> Result<(Vec<AnimationFrame>, Option<BlobPointer>), PipelineError> {
    let id = character.id;
    let mut frames = Vec::with_capacity(raw_frames.len());
    for (index, bytes) in raw_frames.iter().enumerate() {
        let index = index as u32;
        let pointer = ctx
            .blobs
            .put(
                bytes,
                &animation_frame_path(id, request.action, request.direction, index),
            )
            .await?;
        written.push(pointer.clone());
        frames.push(AnimationFrame {
            index,
            pointer,
            loop_pointer: None,
        });
    }

    let loop_pointer = if raw_frames.len() >= 2 {
        let sequenced = raw_frames
            .into_iter()
            .enumerate()
            .map(|(i, bytes)| SequencedFrame::from_bytes(i as u32, bytes))
            .collect();
        match encode_and_store(
            ctx,
            sequenced,
            ctx.config.loop_frame_duration_ms,
            ctx.config.loop_count,
            &animation_loop_path(id, request.action, request.direction),
        )
        .await
        {
            Ok((pointer, _)) => {
                written.push(pointer.clone());
                Some(pointer)
            }
            Err(e) => {
                tracing::warn!(
                    character_id = %id,
                    action = %request.action,
                    direction = %request.direction,
                    error = %e,
                    "Animation loop encoding failed, keeping frames only",
                );
                None
            }
        }
    } else {
        None
    };
    for frame in &mut frames {
        frame.loop_pointer = loop_pointer.clone();
    }

    let mut updated = character.clone();
    updated.set_animation_frames(request.action, request.direction, frames.clone());
    ctx.repo.save(&updated).await?;
    *character = updated;

    Ok((frames, loop_pointer))
}

/// The committed blobs of a slot, read before a new run overwrites them.
struct SlotSnapshot {
    pointers: Vec<BlobPointer>,
    saved: Vec<(BlobPointer, Vec<u8>)>,
}

impl SlotSnapshot {
    async fn capture(
        ctx: &GenerationContext,
        character: &Character,
        action: ActionType,
        direction: Direction,
    ) -> Self {
        let mut pointers: Vec<BlobPointer> = Vec::new();
        for frame in character.animation_frames(action, direction) {
            for pointer in std::iter::once(&frame.pointer).chain(frame.loop_pointer.as_ref()) {
                if !pointers.contains(pointer) {
                    pointers.push(pointer.clone());
                }
            }
        }

        let mut saved = Vec::with_capacity(pointers.len());
        for pointer in &pointers {
            match ctx.blobs.get(pointer).await {
                Ok(bytes) => saved.push((pointer.clone(), bytes)),
                Err(e) => {
                    tracing::warn!(
                        character_id = %character.id,
                        pointer = %pointer,
                        error = %e,
                        "Committed animation blob unreadable, it cannot be restored",
                    );
                }
            }
        }
        Self { pointers, saved }
    }

    /// Put the committed bytes back and drop blobs only the failed run wrote.
    async fn restore(&self, ctx: &GenerationContext, written: &[BlobPointer]) {
        for (pointer, bytes) in &self.saved {
            if let Err(e) = ctx.blobs.put(bytes, pointer.as_str()).await {
                tracing::error!(pointer = %pointer, error = %e, "Failed to restore animation blob");
            }
        }
        for pointer in written.iter().filter(|p| !self.pointers.contains(*p)) {
            if let Err(e) = ctx.blobs.delete(pointer.as_str()).await {
                tracing::warn!(pointer = %pointer, error = %e, "Failed to remove partial animation blob");
            }
        }
    }

    async fn discard_unreferenced(&self, ctx: &GenerationContext, kept: &[AnimationFrame]) {
        let referenced = |p: &BlobPointer| {
            kept.iter()
                .any(|f| &f.pointer == p || f.loop_pointer.as_ref() == Some(p))
        };
        for stale in self.pointers.iter().filter(|p| !referenced(*p)) {
            if let Err(e) = ctx.blobs.delete(stale.as_str()).await {
                tracing::warn!(pointer = %stale, error = %e, "Failed to remove stale animation blob");
            }
        }
    }
}

async fn reference_guided_frames(
    ctx: &GenerationContext,
    character: &Character,
    request: &AnimationRequest,
    descriptor: &str,
) -> Result<Vec<Vec<u8>>, PipelineError> {
    let reference = load_reference(ctx, character, request.reference_override.as_ref()).await?;

    let sequence = SequenceRequest {
        reference,
        description: reference_animation_prompt(descriptor, request.action, request.direction),
        action: request.action,
        direction: request.direction,
        frame_count: request.frame_count,
        guidance_scale: ctx.config.animation_guidance,
        reference_influence: ctx.config.reference_influence,
        size: ctx.config.animation_frame_size,
    };
    let label = format!("animate_{}_{}", request.action, request.direction);
    let mut frames = with_retry(
        &RetryPolicy::rate_limited(),
        ctx.sleeper.as_ref(),
        &label,
        |_| ctx.images.generate_sequence(&sequence),
    )
    .await?;

    if frames.is_empty() {
        return Err(PipelineError::Generation(
            "Provider returned no animation frames".into(),
        ));
    }
    if frames.len() != request.frame_count as usize {
        tracing::warn!(
            character_id = %character.id,
            requested = request.frame_count,
            returned = frames.len(),
            "Provider returned a different frame count",
        );
        frames.truncate(request.frame_count as usize);
    }
    Ok(frames)
}

async fn prompt_only_frames(
    ctx: &GenerationContext,
    character: &Character,
    request: &AnimationRequest,
    descriptor: &str,
) -> Result<Vec<Vec<u8>>, PipelineError> {
    let form = &character.input_params;
    let poses = frame_descriptions(request.action, request.direction, request.frame_count as usize);

    let mut frames = Vec::with_capacity(poses.len());
    for (index, pose) in poses.iter().enumerate() {
        let image_request = ImageRequest {
            description: prompt_only_frame_prompt(
                descriptor,
                request.action,
                request.direction,
                pose,
                form.wants_no_background(),
            ),
            width: form.width(),
            height: form.length(),
            detail: form.detail_level().to_string(),
            direction: Some(request.direction),
            no_background: form.wants_no_background(),
        };
        let label = format!("frame_{}_{}_{index}", request.action, request.direction);
        let bytes = with_retry(
            &RetryPolicy::rate_limited(),
            ctx.sleeper.as_ref(),
            &label,
            |_| ctx.images.generate_image(&image_request),
        )
        .await?;
        frames.push(bytes);
    }
    Ok(frames)
}

/// Bytes of the reference image: the persisted reference, then the south
/// image, then the caller's override. Candidates that cannot be read are
/// skipped.
async fn load_reference(
    ctx: &GenerationContext,
    character: &Character,
    override_pointer: Option<&BlobPointer>,
) -> Result<Vec<u8>, PipelineError> {
    let candidates = character
        .reference_image
        .as_ref()
        .map(|r| &r.pointer)
        .into_iter()
        .chain(character.image_for(BASE_DIRECTION).map(|i| &i.pointer))
        .chain(override_pointer);

    for pointer in candidates {
        match ctx.blobs.get(pointer).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => {
                tracing::warn!(
                    character_id = %character.id,
                    pointer = %pointer,
                    error = %e,
                    "Reference candidate unavailable",
                );
            }
        }
    }

    Err(PipelineError::NotFound {
        entity: "Reference image",
        id: character.id.to_string(),
    })
}
