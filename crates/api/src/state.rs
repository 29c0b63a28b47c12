use std::sync::Arc;

use pixsynth_pipeline::GenerationService;
use pixsynth_storage::StorageConfig;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub service: GenerationService,
    /// Maps blob pointers to public URLs.
    pub storage: Arc<StorageConfig>,
    pub config: Arc<ServerConfig>,
    /// `None` when running on in-memory persistence.
    pub pool: Option<pixsynth_db::DbPool>,
}
