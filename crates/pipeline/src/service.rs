//! Facade over the orchestrators used by the HTTP layer.
//!
//! Every mutating operation loads the character under its per-id lock, so
//! concurrent requests against one character run one after another.

use std::time::Instant;

use pixsynth_core::character::{Character, CharacterStatus, LoopArtifact, Story};
use pixsynth_core::direction::Direction;
use pixsynth_core::form::CharacterForm;
use pixsynth_core::naming::{animation_root, animation_slot_root, character_root};
use pixsynth_core::poses::ActionType;
use pixsynth_core::types::CharacterId;

use crate::animation::{generate_animation, AnimationOutcome, AnimationRequest};
use crate::context::GenerationContext;
use crate::error::PipelineError;
use crate::image_set::generate_image_set;
use crate::locks::CharacterLocks;
use crate::story::generate_story;
use crate::turntable::{generate_turntable, TurntableOptions};

/// Polling snapshot of a character's generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub id: CharacterId,
    pub status: CharacterStatus,
    pub progress: f64,
    pub images_generated: usize,
    pub error_message: Option<String>,
}

/// One page of saved characters.
#[derive(Debug, Clone)]
pub struct GalleryPage {
    pub characters: Vec<Character>,
    pub total: i64,
}

#[derive(Clone)]
pub struct GenerationService {
    ctx: GenerationContext,
    locks: CharacterLocks,
}

impl GenerationService {
    pub fn new(ctx: GenerationContext) -> Self {
        Self {
            ctx,
            locks: CharacterLocks::new(),
        }
    }

    pub fn context(&self) -> &GenerationContext {
        &self.ctx
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    /// Create a character from `form` and run the full generation.
    ///
    /// On success the character ends in `pending_save`. Any error after the
    /// record exists marks it `failed` before the error is returned.
    pub async fn generate_character(&self, form: CharacterForm) -> Result<Character, PipelineError> {
        let form = form.validated()?;
        let mut character = Character::new(form);
        let _guard = self.locks.lock(character.id).await;

        self.ctx.repo.save(&character).await?;
        tracing::info!(character_id = %character.id, name = %character.name, "Character created");

        let started = Instant::now();
        match self.run_generation(&mut character, started).await {
            Ok(()) => Ok(character),
            Err(e) => {
                tracing::error!(character_id = %character.id, error = %e, "Character generation failed");
                if let Err(mark_err) = character.mark_failed(e.to_string()) {
                    tracing::warn!(character_id = %character.id, error = %mark_err, "Could not mark character failed");
                } else if let Err(save_err) = self.ctx.repo.save(&character).await {
                    tracing::error!(character_id = %character.id, error = %save_err, "Failed to persist failed status");
                }
                Err(e)
            }
        }
    }

    async fn run_generation(&self, character: &mut Character, started: Instant) -> Result<(), PipelineError> {
        character.transition_to(CharacterStatus::Generating)?;
        self.ctx.repo.save(character).await?;

        let requested = character.input_params.requested_image_count();
        let outcome = generate_image_set(&self.ctx, character, requested).await?;

        generate_story(&self.ctx, character).await;

        character.generation_time_secs = Some(started.elapsed().as_secs_f64());
        character.transition_to(CharacterStatus::PendingSave)?;
        self.ctx.repo.save(character).await?;

        if !outcome.missing.is_empty() {
            let missing: Vec<&str> = outcome.missing.iter().map(|d| d.as_str()).collect();
            tracing::warn!(
                character_id = %character.id,
                missing = %missing.join(", "),
                "Character generated without some directions",
            );
        }
        tracing::info!(
            character_id = %character.id,
            images = outcome.images.len(),
            elapsed_secs = character.generation_time_secs.unwrap_or_default(),
            "Character generation finished",
        );
        Ok(())
    }

    /// Move a `pending_save` character to `completed`. Already completed
    /// characters are returned unchanged.
    pub async fn confirm_save(&self, id: CharacterId) -> Result<Character, PipelineError> {
        let _guard = self.locks.lock(id).await;
        let mut character = self.load(id).await?;
        match character.status {
            CharacterStatus::Completed => Ok(character),
            CharacterStatus::PendingSave => {
                character.transition_to(CharacterStatus::Completed)?;
                self.ctx.repo.save(&character).await?;
                tracing::info!(character_id = %id, "Character saved");
                Ok(character)
            }
            other => Err(PipelineError::Conflict(format!(
                "Character {id} cannot be saved while {other}"
            ))),
        }
    }

    /// Generate one animation slot. On failure the stored record is left
    /// as it was.
    pub async fn generate_animation(
        &self,
        id: CharacterId,
        request: AnimationRequest,
    ) -> Result<(Character, AnimationOutcome), PipelineError> {
        let _guard = self.locks.lock(id).await;
        let mut character = self.load(id).await?;
        let outcome = generate_animation(&self.ctx, &mut character, &request).await?;
        Ok((character, outcome))
    }

    pub async fn generate_turntable(
        &self,
        id: CharacterId,
        options: TurntableOptions,
    ) -> Result<(Character, LoopArtifact), PipelineError> {
        let _guard = self.locks.lock(id).await;
        let mut character = self.load(id).await?;
        let artifact = generate_turntable(&self.ctx, &mut character, options).await?;
        Ok((character, artifact))
    }

    /// Regenerate the backstory. A provider failure keeps the old story
    /// and yields `None`.
    pub async fn regenerate_story(&self, id: CharacterId) -> Result<(Character, Option<Story>), PipelineError> {
        let _guard = self.locks.lock(id).await;
        let mut character = self.load(id).await?;
        let story = generate_story(&self.ctx, &mut character).await;
        if story.is_some() {
            self.ctx.repo.save(&character).await?;
        }
        Ok((character, story))
    }

    // -----------------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------------

    /// Remove a whole action with its blobs. Returns `false` when the
    /// character has no such action.
    pub async fn delete_animation(&self, id: CharacterId, action: ActionType) -> Result<bool, PipelineError> {
        let _guard = self.locks.lock(id).await;
        let mut character = self.load(id).await?;
        if !character.remove_animation(action) {
            return Ok(false);
        }
        self.ctx.repo.save(&character).await?;
        self.delete_blobs(&animation_root(id, action)).await;
        tracing::info!(character_id = %id, action = %action, "Animation deleted");
        Ok(true)
    }

    pub async fn delete_animation_direction(
        &self,
        id: CharacterId,
        action: ActionType,
        direction: Direction,
    ) -> Result<bool, PipelineError> {
        let _guard = self.locks.lock(id).await;
        let mut character = self.load(id).await?;
        if !character.clear_animation_direction(action, direction) {
            return Ok(false);
        }
        self.ctx.repo.save(&character).await?;
        self.delete_blobs(&animation_slot_root(id, action, direction)).await;
        tracing::info!(character_id = %id, action = %action, direction = %direction, "Animation direction deleted");
        Ok(true)
    }

    /// Delete the record and every blob under the character's root.
    pub async fn delete_character(&self, id: CharacterId) -> Result<bool, PipelineError> {
        let _guard = self.locks.lock(id).await;
        let deleted = self.ctx.repo.delete(id).await?;
        if deleted {
            self.delete_blobs(&character_root(id)).await;
            tracing::info!(character_id = %id, "Character deleted");
        }
        Ok(deleted)
    }

    async fn delete_blobs(&self, prefix: &str) {
        if let Err(e) = self.ctx.blobs.delete(prefix).await {
            tracing::warn!(prefix, error = %e, "Failed to delete blobs");
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn get(&self, id: CharacterId) -> Result<Character, PipelineError> {
        self.load(id).await
    }

    pub async fn status(&self, id: CharacterId) -> Result<StatusReport, PipelineError> {
        let character = self.load(id).await?;
        Ok(StatusReport {
            id,
            status: character.status,
            progress: character.progress(),
            images_generated: character.images().len(),
            error_message: character.error_message.clone(),
        })
    }

    /// Completed characters, newest first.
    pub async fn gallery(&self, limit: i64, skip: i64) -> Result<GalleryPage, PipelineError> {
        if limit < 1 || skip < 0 {
            return Err(PipelineError::Validation(
                "limit must be positive and skip non-negative".into(),
            ));
        }
        let characters = self
            .ctx
            .repo
            .list_by_status(CharacterStatus::Completed, limit, skip)
            .await?;
        let total = self.ctx.repo.count_by_status(CharacterStatus::Completed).await?;
        Ok(GalleryPage { characters, total })
    }

    async fn load(&self, id: CharacterId) -> Result<Character, PipelineError> {
        self.ctx
            .repo
            .load(id)
            .await?
            .ok_or_else(|| PipelineError::character_not_found(id))
    }
}
