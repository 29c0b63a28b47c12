use pixsynth_core::config::env_parse;
use pixsynth_core::loop_encoder::{DEFAULT_FRAME_DURATION_MS, INFINITE_LOOP};

/// Frame count used when an animation request names none.
pub const DEFAULT_FRAME_COUNT: u32 = 4;
/// Largest animation frame count accepted.
pub const MAX_FRAME_COUNT: u32 = 20;

/// Tunables for the generation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Guidance strength for direction transforms.
    pub transform_guidance: f32,
    /// Reference guidance for reference-guided animation (kept in 2.0-2.4).
    pub animation_guidance: f32,
    /// Reference influence for reference-guided animation.
    pub reference_influence: f32,
    /// Edge length of reference-guided animation frames.
    pub animation_frame_size: u32,
    pub loop_frame_duration_ms: u32,
    pub loop_count: u16,
    pub story_max_tokens: u32,
    pub story_temperature: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            transform_guidance: 7.5,
            animation_guidance: 2.2,
            reference_influence: 300.0,
            animation_frame_size: 64,
            loop_frame_duration_ms: DEFAULT_FRAME_DURATION_MS,
            loop_count: INFINITE_LOOP,
            story_max_tokens: 150,
            story_temperature: 0.7,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `LOOP_FRAME_DURATION_MS`  | `200`   |
    /// | `STORY_MAX_TOKENS`        | `150`   |
    /// | `STORY_TEMPERATURE`       | `0.7`   |
    ///
    /// Guidance and reference parameters are locked and not read from the
    /// environment.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            loop_frame_duration_ms: env_parse(
                "LOOP_FRAME_DURATION_MS",
                defaults.loop_frame_duration_ms,
            ),
            story_max_tokens: env_parse("STORY_MAX_TOKENS", defaults.story_max_tokens),
            story_temperature: env_parse("STORY_TEMPERATURE", defaults.story_temperature),
            ..defaults
        }
    }
}
