//! Provider-neutral request types and gateway traits.

use async_trait::async_trait;
use pixsynth_core::direction::Direction;
use pixsynth_core::poses::ActionType;

use crate::error::GatewayError;

/// Single image from text.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub description: String,
    pub width: u32,
    pub height: u32,
    pub detail: String,
    pub direction: Option<Direction>,
    pub no_background: bool,
}

/// Re-render an existing image from another viewing direction.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionTransformRequest {
    pub source: Vec<u8>,
    pub from: Direction,
    pub to: Direction,
    pub width: u32,
    pub height: u32,
    pub guidance_scale: f32,
}

/// In-sequence animation frames guided by a reference image.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceRequest {
    pub reference: Vec<u8>,
    pub description: String,
    pub action: ActionType,
    pub direction: Direction,
    pub frame_count: u32,
    pub guidance_scale: f32,
    pub reference_influence: f32,
    pub size: u32,
}

/// Raster generation capabilities.
#[async_trait]
pub trait ImageGateway: Send + Sync {
    async fn generate_image(&self, request: &ImageRequest) -> Result<Vec<u8>, GatewayError>;

    async fn transform_direction(
        &self,
        request: &DirectionTransformRequest,
    ) -> Result<Vec<u8>, GatewayError>;

    async fn generate_sequence(
        &self,
        request: &SequenceRequest,
    ) -> Result<Vec<Vec<u8>>, GatewayError>;
}

/// Free-text generation.
#[async_trait]
pub trait TextGateway: Send + Sync {
    async fn generate_text(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GatewayError>;
}
