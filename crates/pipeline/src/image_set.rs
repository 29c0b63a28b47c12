//! Multi-directional sprite set generation for a new character.
//!
//! The south-facing base image is generated from text first. Every other
//! requested direction is derived from the base image's bytes, so all
//! directions share one visual source. The character is saved after each
//! successful image so an interrupted run keeps its progress.

use pixsynth_core::character::{Character, CharacterImage};
use pixsynth_core::direction::{sort_clockwise, Direction, ImageCount, BASE_DIRECTION, DEFAULT_IMAGE_COUNT};
use pixsynth_core::identity::build_identity_descriptor;
use pixsynth_core::naming::direction_image_path;
use pixsynth_core::prompts::base_image_prompt;
use pixsynth_core::retry::RetryPolicy;
use pixsynth_gateway::{DirectionTransformRequest, ImageRequest};

use crate::context::GenerationContext;
use crate::error::PipelineError;
use crate::retry::with_retry;

/// Result of a sprite set run.
#[derive(Debug, Clone)]
pub struct ImageSetOutcome {
    /// Generated images in clockwise order.
    pub images: Vec<CharacterImage>,
    /// Requested directions that could not be derived.
    pub missing: Vec<Direction>,
}

/// Generate the sprite set for `character`.
///
/// Fails only when the base image cannot be produced; individual
/// derived directions that fail are reported in
/// [`ImageSetOutcome::missing`].
pub async fn generate_image_set(
    ctx: &GenerationContext,
    character: &mut Character,
    requested_count: u32,
) -> Result<ImageSetOutcome, PipelineError> {
    let count = ImageCount::from_requested(requested_count).unwrap_or_else(|| {
        tracing::warn!(
            character_id = %character.id,
            requested_count,
            fallback = DEFAULT_IMAGE_COUNT.as_u32(),
            "Unsupported image count, using default",
        );
        DEFAULT_IMAGE_COUNT
    });
    let directions = count.directions();
    let form = character.input_params.clone();

    // Descriptor first, persisted before any provider call.
    let descriptor = match character.identity_descriptor() {
        Some(existing) => existing.to_string(),
        None => {
            let built = build_identity_descriptor(&form, form.width());
            character.set_identity_descriptor(built.clone())?;
            ctx.repo.save(character).await?;
            built
        }
    };

    tracing::info!(
        character_id = %character.id,
        count = count.as_u32(),
        "Generating base image",
    );

    let base_request = ImageRequest {
        description: base_image_prompt(&descriptor),
        width: form.width(),
        height: form.length(),
        detail: form.detail_level().to_string(),
        direction: Some(BASE_DIRECTION),
        no_background: form.wants_no_background(),
    };
    let base_bytes = with_retry(
        &RetryPolicy::base_image(),
        ctx.sleeper.as_ref(),
        "base_image",
        |_| ctx.images.generate_image(&base_request),
    )
    .await?;

    let base_pointer = ctx
        .blobs
        .put(&base_bytes, &direction_image_path(character.id, BASE_DIRECTION, 0))
        .await?;
    character.put_image(BASE_DIRECTION, 0, base_pointer.clone());
    character.set_reference_image(base_pointer, BASE_DIRECTION);
    ctx.repo.save(character).await?;

    if count == ImageCount::One {
        return Ok(ImageSetOutcome {
            images: character.images_clockwise(),
            missing: Vec::new(),
        });
    }

    let mut next_index = 1u32;
    for &direction in directions.iter().filter(|d| **d != BASE_DIRECTION) {
        let request = DirectionTransformRequest {
            source: base_bytes.clone(),
            from: BASE_DIRECTION,
            to: direction,
            width: form.width(),
            height: form.length(),
            guidance_scale: ctx.config.transform_guidance,
        };
        let label = format!("transform_{direction}");
        let result = with_retry(
            &RetryPolicy::direction_transform(),
            ctx.sleeper.as_ref(),
            &label,
            |_| ctx.images.transform_direction(&request),
        )
        .await;

        match result {
            Ok(bytes) => {
                let pointer = ctx
                    .blobs
                    .put(&bytes, &direction_image_path(character.id, direction, next_index))
                    .await?;
                character.put_image(direction, next_index, pointer);
                ctx.repo.save(character).await?;
                tracing::info!(
                    character_id = %character.id,
                    direction = %direction,
                    index = next_index,
                    "Derived direction image",
                );
                next_index += 1;
            }
            Err(e) => {
                tracing::error!(
                    character_id = %character.id,
                    direction = %direction,
                    error = %e,
                    "Skipping direction after retries",
                );
            }
        }
    }

    let mut images: Vec<CharacterImage> = character
        .images()
        .iter()
        .filter(|i| directions.contains(&i.direction))
        .cloned()
        .collect();
    sort_clockwise(&mut images, |i| i.direction);

    if images.is_empty() {
        return Err(PipelineError::Generation(
            "No direction images could be generated".into(),
        ));
    }

    let missing: Vec<Direction> = directions
        .iter()
        .copied()
        .filter(|d| !images.iter().any(|i| i.direction == *d))
        .collect();
    if missing.is_empty() {
        tracing::info!(
            character_id = %character.id,
            generated = images.len(),
            "All requested directions generated",
        );
    } else {
        let names: Vec<&str> = missing.iter().map(|d| d.as_str()).collect();
        tracing::warn!(
            character_id = %character.id,
            missing = %names.join(", "),
            generated = images.len(),
            requested = directions.len(),
            "Some directions are missing",
        );
    }

    Ok(ImageSetOutcome { images, missing })
}
