use std::sync::Arc;

use pixsynth_core::ports::{BlobStore, CharacterRepository};
use pixsynth_gateway::{ImageGateway, TextGateway};

use crate::config::PipelineConfig;
use crate::retry::Sleeper;

/// Collaborators shared by every orchestrator.
#[derive(Clone)]
pub struct GenerationContext {
    pub images: Arc<dyn ImageGateway>,
    pub text: Arc<dyn TextGateway>,
    pub repo: Arc<dyn CharacterRepository>,
    pub blobs: Arc<dyn BlobStore>,
    pub sleeper: Arc<dyn Sleeper>,
    pub config: PipelineConfig,
}
