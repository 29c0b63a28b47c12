use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pixsynth_core::error::CoreError;
use pixsynth_gateway::GatewayError;
use pixsynth_pipeline::PipelineError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce `{ "error", "code" }` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Pipeline(e) => classify_pipeline_error(e),
            AppError::Core(e) => classify_pipeline_error(e.into()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::InternalError(msg) => internal(&msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_pipeline_error(err: PipelineError) -> (StatusCode, &'static str, String) {
    match err {
        PipelineError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
        PipelineError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        PipelineError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
        PipelineError::Generation(msg) => (StatusCode::BAD_GATEWAY, "GENERATION_FAILED", msg),
        PipelineError::Storage(msg) => internal(&msg),
        PipelineError::Gateway(e) => classify_gateway_error(e),
    }
}

/// - 429 from the provider stays 429 so clients can back off.
/// - Timeouts map to 504.
/// - A missing provider key is a 503.
/// - Everything else is a 502 carrying the provider detail.
fn classify_gateway_error(err: GatewayError) -> (StatusCode, &'static str, String) {
    let message = err.to_string();
    match err {
        GatewayError::RateLimited { .. } => {
            (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", message)
        }
        GatewayError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "PROVIDER_TIMEOUT", message),
        GatewayError::NotConfigured(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "PROVIDER_NOT_CONFIGURED",
            message,
        ),
        GatewayError::Connection(_)
        | GatewayError::Api { .. }
        | GatewayError::Malformed(_)
        | GatewayError::Request(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message),
    }
}

fn internal(detail: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %detail, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
