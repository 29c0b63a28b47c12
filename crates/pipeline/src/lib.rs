//! Generation orchestration for PixSynth characters.
//!
//! [`GenerationService`] is the entry point. The orchestrator modules
//! ([`image_set`], [`animation`], [`turntable`], [`story`]) each take a
//! [`GenerationContext`] and a character to mutate.

pub mod animation;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod image_set;
pub mod locks;
pub mod loops;
pub mod retry;
pub mod service;
pub mod story;
pub mod turntable;

pub use animation::{AnimationMode, AnimationOutcome, AnimationRequest};
pub use config::{PipelineConfig, DEFAULT_FRAME_COUNT, MAX_FRAME_COUNT};
pub use context::GenerationContext;
pub use descriptor::DescriptorSource;
pub use error::PipelineError;
pub use retry::{Sleeper, TokioSleeper};
pub use service::{GalleryPage, GenerationService, StatusReport};
pub use turntable::TurntableOptions;
