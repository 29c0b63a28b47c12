use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::routes;
use crate::state::AppState;

/// Full application router with the middleware stack.
///
/// Blobs under the storage root are served at the storage public prefix
/// (`/static` by default).
pub fn build_app(state: AppState) -> Router {
    let config = state.config.clone();
    let static_prefix = static_mount(&state.storage.public_base_url);
    let static_files = ServeDir::new(&state.storage.root);

    let request_id_header = HeaderName::from_static("x-request-id");

    let mut app = Router::new()
        // Health check at root level (not under /api/v1).
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes());
    if let Some(prefix) = static_prefix {
        app = app.nest_service(&prefix, static_files);
    }

    app
        // -- Middleware stack (applied bottom-up) --
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(build_cors_layer(&config.cors_origins))
        .with_state(state)
}

/// Mount point for static blobs, or `None` when the public URL is absolute
/// (blobs served by something else).
fn static_mount(public_base_url: &str) -> Option<String> {
    let trimmed = public_base_url.trim_end_matches('/');
    if trimmed.starts_with('/') && trimmed.len() > 1 {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Invalid origins are logged and skipped.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_mount_only_for_relative_prefixes() {
        assert_eq!(static_mount("/static/"), Some("/static".to_string()));
        assert_eq!(static_mount("https://cdn.example.com"), None);
        assert_eq!(static_mount("/"), None);
    }
}
