pub mod characters;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::handlers::gallery;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /characters/...                                  see routes::characters
/// /gallery                                         completed characters (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/characters", characters::router())
        .route("/gallery", get(gallery::list))
}
