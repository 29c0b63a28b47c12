use pixsynth_core::error::CoreError;
use pixsynth_core::loop_encoder::LoopEncodeError;
use pixsynth_gateway::GatewayError;

/// Errors surfaced by the generation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Generation could not produce a usable result.
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// A provider call failed after its retry policy was exhausted.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<CoreError> for PipelineError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::Conflict(msg) => Self::Conflict(msg),
            CoreError::Storage(msg) => Self::Storage(msg),
            CoreError::Internal(msg) => Self::Storage(msg),
        }
    }
}

impl From<LoopEncodeError> for PipelineError {
    fn from(e: LoopEncodeError) -> Self {
        match e {
            LoopEncodeError::Empty => Self::Validation(e.to_string()),
            LoopEncodeError::MissingFrame { .. } => Self::NotFound {
                entity: "Frame",
                id: e.to_string(),
            },
            other => Self::Generation(other.to_string()),
        }
    }
}

impl PipelineError {
    pub fn character_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "Character",
            id: id.to_string(),
        }
    }
}
