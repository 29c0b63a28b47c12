//! `AppError` to HTTP response mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use pixsynth_api::error::AppError;
use pixsynth_core::error::CoreError;
use pixsynth_gateway::GatewayError;
use pixsynth_pipeline::PipelineError;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn not_found_returns_404() {
    let err = AppError::Pipeline(PipelineError::character_not_found("abc"));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Character with id abc not found");
}

#[tokio::test]
async fn core_validation_returns_400() {
    let err = AppError::Core(CoreError::Validation("bad direction".into()));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "bad direction");
}

#[tokio::test]
async fn conflict_returns_409() {
    let err = AppError::Pipeline(PipelineError::Conflict("not ready".into()));
    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn provider_rate_limit_returns_429() {
    let err = AppError::Pipeline(PipelineError::Gateway(GatewayError::RateLimited {
        detail: "quota".into(),
    }));
    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn provider_errors_map_to_gateway_statuses() {
    let cases = [
        (GatewayError::Timeout("180s".into()), StatusCode::GATEWAY_TIMEOUT),
        (GatewayError::NotConfigured("PixelLab"), StatusCode::SERVICE_UNAVAILABLE),
        (
            GatewayError::Api {
                status: 500,
                body: "boom".into(),
            },
            StatusCode::BAD_GATEWAY,
        ),
    ];
    for (err, expected) in cases {
        let (status, _) = error_to_response(AppError::Pipeline(err.into())).await;
        assert_eq!(status, expected);
    }
}

#[tokio::test]
async fn storage_errors_are_sanitized() {
    let err = AppError::Pipeline(PipelineError::Storage("/var/secret/path".into()));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(!json.to_string().contains("secret"));
}
