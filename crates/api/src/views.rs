//! Response shapes for characters, with blob pointers resolved to public
//! URLs.

use std::collections::BTreeMap;

use pixsynth_core::character::{AnimationFrame, Character, CharacterStatus, LoopArtifact, Story};
use pixsynth_core::direction::Direction;
use pixsynth_core::form::CharacterForm;
use pixsynth_core::types::{CharacterId, Timestamp};
use pixsynth_pipeline::StatusReport;
use pixsynth_storage::StorageConfig;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ImageView {
    pub direction: Direction,
    pub index: u32,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ReferenceView {
    pub direction: Direction,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct LoopView {
    pub url: String,
    pub frame_duration_ms: u32,
    pub loop_count: u16,
    pub frame_count: u32,
    pub created_at: Timestamp,
}

impl LoopView {
    pub fn new(artifact: &LoopArtifact, storage: &StorageConfig) -> Self {
        Self {
            url: storage.public_url(&artifact.pointer),
            frame_duration_ms: artifact.frame_duration_ms,
            loop_count: artifact.loop_count,
            frame_count: artifact.frame_count,
            created_at: artifact.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FrameView {
    pub index: u32,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_url: Option<String>,
}

impl FrameView {
    pub fn new(frame: &AnimationFrame, storage: &StorageConfig) -> Self {
        Self {
            index: frame.index,
            url: storage.public_url(&frame.pointer),
            loop_url: frame.loop_pointer.as_ref().map(|p| storage.public_url(p)),
        }
    }
}

/// Action name -> direction name -> frames. Every direction of a present
/// action is listed, empty or not.
pub type AnimationsView = BTreeMap<&'static str, BTreeMap<&'static str, Vec<FrameView>>>;

#[derive(Debug, Serialize)]
pub struct CharacterView {
    pub id: CharacterId,
    pub name: String,
    pub description: Option<String>,
    pub status: CharacterStatus,
    pub progress: f64,
    pub input_params: CharacterForm,
    pub reference_image: Option<ReferenceView>,
    pub images: Vec<ImageView>,
    pub story: Option<Story>,
    #[serde(rename = "loop")]
    pub loop_artifact: Option<LoopView>,
    pub animations: AnimationsView,
    pub generation_time_secs: Option<f64>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CharacterView {
    pub fn new(character: &Character, storage: &StorageConfig) -> Self {
        let images = character
            .images_clockwise()
            .into_iter()
            .map(|i| ImageView {
                url: storage.public_url(&i.pointer),
                direction: i.direction,
                index: i.index,
            })
            .collect();

        let animations = character
            .animations()
            .iter()
            .map(|(action, frames)| {
                let by_direction = frames
                    .iter()
                    .map(|(direction, list)| {
                        let views = list.iter().map(|f| FrameView::new(f, storage)).collect();
                        (direction.as_str(), views)
                    })
                    .collect();
                (action.as_str(), by_direction)
            })
            .collect();

        Self {
            id: character.id,
            name: character.name.clone(),
            description: character.description.clone(),
            status: character.status,
            progress: character.progress(),
            input_params: character.input_params.clone(),
            reference_image: character.reference_image.as_ref().map(|r| ReferenceView {
                direction: r.direction,
                url: storage.public_url(&r.pointer),
            }),
            images,
            story: character.story.clone(),
            loop_artifact: character
                .loop_artifact
                .as_ref()
                .map(|a| LoopView::new(a, storage)),
            animations,
            generation_time_secs: character.generation_time_secs,
            error_message: character.error_message.clone(),
            created_at: character.created_at,
            updated_at: character.updated_at,
        }
    }
}

/// Compact gallery entry.
#[derive(Debug, Serialize)]
pub struct GalleryItem {
    pub id: CharacterId,
    pub name: String,
    pub thumbnail_url: Option<String>,
    pub loop_url: Option<String>,
    pub image_count: usize,
    pub created_at: Timestamp,
}

impl GalleryItem {
    pub fn new(character: &Character, storage: &StorageConfig) -> Self {
        let thumbnail = character
            .reference_image
            .as_ref()
            .map(|r| &r.pointer)
            .or_else(|| character.images().first().map(|i| &i.pointer));
        Self {
            id: character.id,
            name: character.name.clone(),
            thumbnail_url: thumbnail.map(|p| storage.public_url(p)),
            loop_url: character
                .loop_artifact
                .as_ref()
                .map(|a| storage.public_url(&a.pointer)),
            image_count: character.images().len(),
            created_at: character.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub id: CharacterId,
    pub status: CharacterStatus,
    pub progress: f64,
    pub images_generated: usize,
    pub error_message: Option<String>,
}

impl From<StatusReport> for StatusView {
    fn from(report: StatusReport) -> Self {
        Self {
            id: report.id,
            status: report.status,
            progress: report.progress,
            images_generated: report.images_generated,
            error_message: report.error_message,
        }
    }
}
