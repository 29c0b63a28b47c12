//! The `Character` aggregate and its owned value types.
//!
//! Orchestrators mutate a character one logical step at a time (one
//! direction image, one frame set) and persist after each step. Every
//! mutation goes through a method here so the aggregate's invariants hold
//! no matter which orchestrator is driving it:
//!
//! - status changes follow [`CharacterStatus::can_transition_to`];
//! - the identity descriptor is written at most once;
//! - `images` holds at most one entry per direction;
//! - animation frame lists are always sorted by sequence index and every
//!   direction is present (possibly empty).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::direction::{sort_clockwise, Direction, CLOCKWISE};
use crate::error::CoreError;
use crate::form::CharacterForm;
use crate::poses::ActionType;
use crate::types::{BlobPointer, CharacterId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterStatus {
    Pending,
    Generating,
    PendingSave,
    Completed,
    Failed,
}

impl CharacterStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::PendingSave => "pending_save",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Allowed lifecycle edges. `completed` and `failed` are terminal.
    pub fn can_transition_to(self, next: CharacterStatus) -> bool {
        use CharacterStatus::*;
        matches!(
            (self, next),
            (Pending, Generating)
                | (Pending, Failed)
                | (Generating, PendingSave)
                | (Generating, Failed)
                | (PendingSave, Completed)
                | (PendingSave, Failed)
        )
    }
}

impl fmt::Display for CharacterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharacterStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "generating" => Ok(Self::Generating),
            "pending_save" => Ok(Self::PendingSave),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Invalid character status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Owned value types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceImage {
    pub pointer: BlobPointer,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterImage {
    pub direction: Direction,
    pub index: u32,
    pub pointer: BlobPointer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub content: String,
    pub prompt: String,
    pub generated_at: Timestamp,
}

/// Metadata of an encoded loop (GIF) artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopArtifact {
    pub pointer: BlobPointer,
    pub frame_duration_ms: u32,
    /// 0 means loop forever.
    pub loop_count: u16,
    pub frame_count: u32,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationFrame {
    pub index: u32,
    pub pointer: BlobPointer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_pointer: Option<BlobPointer>,
}

/// Frame lists for one action, one field per direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DirectionFrames {
    #[serde(default)]
    pub north: Vec<AnimationFrame>,
    #[serde(default)]
    pub north_east: Vec<AnimationFrame>,
    #[serde(default)]
    pub east: Vec<AnimationFrame>,
    #[serde(default)]
    pub south_east: Vec<AnimationFrame>,
    #[serde(default)]
    pub south: Vec<AnimationFrame>,
    #[serde(default)]
    pub south_west: Vec<AnimationFrame>,
    #[serde(default)]
    pub west: Vec<AnimationFrame>,
    #[serde(default)]
    pub north_west: Vec<AnimationFrame>,
}

impl DirectionFrames {
    pub fn get(&self, direction: Direction) -> &[AnimationFrame] {
        match direction {
            Direction::North => &self.north,
            Direction::NorthEast => &self.north_east,
            Direction::East => &self.east,
            Direction::SouthEast => &self.south_east,
            Direction::South => &self.south,
            Direction::SouthWest => &self.south_west,
            Direction::West => &self.west,
            Direction::NorthWest => &self.north_west,
        }
    }

    fn slot_mut(&mut self, direction: Direction) -> &mut Vec<AnimationFrame> {
        match direction {
            Direction::North => &mut self.north,
            Direction::NorthEast => &mut self.north_east,
            Direction::East => &mut self.east,
            Direction::SouthEast => &mut self.south_east,
            Direction::South => &mut self.south,
            Direction::SouthWest => &mut self.south_west,
            Direction::West => &mut self.west,
            Direction::NorthWest => &mut self.north_west,
        }
    }

    /// Replace one direction's frames, sorted by sequence index.
    pub fn replace(&mut self, direction: Direction, mut frames: Vec<AnimationFrame>) {
        frames.sort_by_key(|f| f.index);
        *self.slot_mut(direction) = frames;
    }

    /// Empty one direction; returns whether it held any frames.
    pub fn clear(&mut self, direction: Direction) -> bool {
        let slot = self.slot_mut(direction);
        let had_frames = !slot.is_empty();
        slot.clear();
        had_frames
    }

    /// `(direction, frames)` pairs in clockwise order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &[AnimationFrame])> {
        CLOCKWISE.into_iter().map(move |d| (d, self.get(d)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, frames)| frames.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: CharacterStatus,
    pub input_params: CharacterForm,
    #[serde(default)]
    identity_descriptor: Option<String>,
    #[serde(default)]
    pub reference_image: Option<ReferenceImage>,
    #[serde(default)]
    images: Vec<CharacterImage>,
    #[serde(default)]
    pub story: Option<Story>,
    #[serde(default)]
    pub loop_artifact: Option<LoopArtifact>,
    #[serde(default)]
    animations: BTreeMap<ActionType, DirectionFrames>,
    #[serde(default)]
    pub generation_time_secs: Option<f64>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Character {
    /// Fresh `pending` character for a validated form.
    pub fn new(form: CharacterForm) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            name: form.name.clone(),
            description: form.description.clone(),
            status: CharacterStatus::Pending,
            input_params: form,
            identity_descriptor: None,
            reference_image: None,
            images: Vec::new(),
            story: None,
            loop_artifact: None,
            animations: BTreeMap::new(),
            generation_time_secs: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }

    /// Move to `next`, rejecting edges the lifecycle does not allow.
    pub fn transition_to(&mut self, next: CharacterStatus) -> Result<(), CoreError> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::Conflict(format!(
                "Character {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    /// Mark failed from any non-terminal state, recording why.
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<(), CoreError> {
        self.transition_to(CharacterStatus::Failed)?;
        self.error_message = Some(reason.into());
        Ok(())
    }

    pub fn identity_descriptor(&self) -> Option<&str> {
        self.identity_descriptor.as_deref()
    }

    /// Write the identity descriptor. Rewriting it with the same text is a
    /// no-op; any other text is a conflict.
    pub fn set_identity_descriptor(&mut self, descriptor: String) -> Result<(), CoreError> {
        match &self.identity_descriptor {
            Some(existing) if *existing == descriptor => Ok(()),
            Some(_) => Err(CoreError::Conflict(format!(
                "Identity descriptor of character {} is already set",
                self.id
            ))),
            None => {
                self.identity_descriptor = Some(descriptor);
                self.touch();
                Ok(())
            }
        }
    }

    // -- Direction images --------------------------------------------------

    pub fn images(&self) -> &[CharacterImage] {
        &self.images
    }

    pub fn image_for(&self, direction: Direction) -> Option<&CharacterImage> {
        self.images.iter().find(|i| i.direction == direction)
    }

    /// Insert or replace the image for `direction`.
    pub fn put_image(&mut self, direction: Direction, index: u32, pointer: BlobPointer) {
        let image = CharacterImage {
            direction,
            index,
            pointer,
        };
        match self.images.iter_mut().find(|i| i.direction == direction) {
            Some(existing) => *existing = image,
            None => self.images.push(image),
        }
        self.touch();
    }

    /// Images in clockwise order starting from north.
    pub fn images_clockwise(&self) -> Vec<CharacterImage> {
        let mut images = self.images.clone();
        sort_clockwise(&mut images, |i| i.direction);
        images
    }

    /// Completion estimate for status polling, in `0.0..=1.0`.
    ///
    /// While generating, this is the share of requested images already
    /// stored, capped at 0.9 until the run finishes.
    pub fn progress(&self) -> f64 {
        match self.status {
            CharacterStatus::Completed | CharacterStatus::PendingSave => 1.0,
            CharacterStatus::Generating => {
                let expected = self.input_params.image_count_or_default().as_u32() as f64;
                (self.images.len() as f64 / expected).min(0.9)
            }
            CharacterStatus::Pending | CharacterStatus::Failed => 0.0,
        }
    }

    pub fn set_reference_image(&mut self, pointer: BlobPointer, direction: Direction) {
        self.reference_image = Some(ReferenceImage { pointer, direction });
        self.touch();
    }

    // -- Animations --------------------------------------------------------

    pub fn animations(&self) -> &BTreeMap<ActionType, DirectionFrames> {
        &self.animations
    }

    pub fn animation_frames(&self, action: ActionType, direction: Direction) -> &[AnimationFrame] {
        self.animations
            .get(&action)
            .map(|d| d.get(direction))
            .unwrap_or_default()
    }

    /// Replace the frame list of one action/direction slot.
    pub fn set_animation_frames(
        &mut self,
        action: ActionType,
        direction: Direction,
        frames: Vec<AnimationFrame>,
    ) {
        self.animations
            .entry(action)
            .or_default()
            .replace(direction, frames);
        self.touch();
    }

    /// Drop a whole action. Returns whether it existed.
    pub fn remove_animation(&mut self, action: ActionType) -> bool {
        let removed = self.animations.remove(&action).is_some();
        if removed {
            self.touch();
        }
        removed
    }

    /// Empty one direction of an action, keeping the action entry.
    /// Returns `false` when the action does not exist.
    pub fn clear_animation_direction(&mut self, action: ActionType, direction: Direction) -> bool {
        match self.animations.get_mut(&action) {
            Some(frames) => {
                frames.clear(direction);
                self.touch();
                true
            }
            None => false,
        }
    }
}
