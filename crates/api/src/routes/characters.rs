use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{animations, characters};
use crate::state::AppState;

/// Routes mounted at `/characters`.
///
/// ```text
/// POST   /generate                                          -> generate
/// GET    /{id}                                              -> get_by_id
/// DELETE /{id}                                              -> delete
/// GET    /{id}/status                                       -> status
/// POST   /{id}/save                                         -> save
/// POST   /{id}/story                                        -> regenerate_story
/// POST   /{id}/gif                                          -> create_loop
/// DELETE /{id}/animations/{action}                          -> animations::delete
/// POST   /{id}/animations/{action}/directions/{direction}   -> animations::generate
/// DELETE /{id}/animations/{action}/directions/{direction}   -> animations::delete_direction
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(characters::generate))
        .route(
            "/{id}",
            get(characters::get_by_id).delete(characters::delete),
        )
        .route("/{id}/status", get(characters::status))
        .route("/{id}/save", post(characters::save))
        .route("/{id}/story", post(characters::regenerate_story))
        .route("/{id}/gif", post(characters::create_loop))
        .route("/{id}/animations/{action}", delete(animations::delete))
        .route(
            "/{id}/animations/{action}/directions/{direction}",
            post(animations::generate).delete(animations::delete_direction),
        )
}
