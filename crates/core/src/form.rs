//! Character creation form (the `input_params` retained on every character).
//!
//! Field names are camelCase on the wire to match the web client.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::direction::{ImageCount, DEFAULT_IMAGE_COUNT};
use crate::error::CoreError;

/// Default sprite edge length in pixels.
pub const DEFAULT_IMAGE_SIZE: u32 = 64;
/// Default detail level passed to the image provider.
pub const DEFAULT_DETAIL: &str = "medium detail";

/// Raw character creation request, persisted verbatim for regeneration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CharacterForm {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appearance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_features: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 64, max = 512))]
    pub image_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 64, max = 512))]
    pub image_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_background: Option<bool>,
}

impl CharacterForm {
    /// Trim the name and run the declarative field rules.
    pub fn validated(mut self) -> Result<Self, CoreError> {
        self.name = self.name.trim().to_string();
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        Ok(self)
    }

    pub fn requested_image_count(&self) -> u32 {
        self.image_count.unwrap_or(DEFAULT_IMAGE_COUNT.as_u32())
    }

    /// Resolved image count; unsupported values fall back to the default.
    pub fn image_count_or_default(&self) -> ImageCount {
        ImageCount::from_requested(self.requested_image_count()).unwrap_or(DEFAULT_IMAGE_COUNT)
    }

    pub fn width(&self) -> u32 {
        self.image_width.unwrap_or(DEFAULT_IMAGE_SIZE)
    }

    pub fn length(&self) -> u32 {
        self.image_length.unwrap_or(DEFAULT_IMAGE_SIZE)
    }

    pub fn detail_level(&self) -> &str {
        self.detail.as_deref().unwrap_or(DEFAULT_DETAIL)
    }

    /// Transparent background unless the form opts out.
    pub fn wants_no_background(&self) -> bool {
        self.no_background.unwrap_or(true)
    }

    /// Non-empty optional field, treating blank strings as absent.
    pub(crate) fn non_empty(field: &Option<String>) -> Option<&str> {
        field.as_deref().filter(|s| !s.trim().is_empty())
    }
}
