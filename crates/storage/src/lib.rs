//! Blob store implementations.

pub mod local;
pub mod memory;
pub mod path;

use std::path::PathBuf;

use pixsynth_core::config::env_string;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

/// Blob storage settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory all logical paths resolve under.
    pub root: PathBuf,
    /// URL prefix blobs are served from.
    pub public_base_url: String,
}

impl StorageConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default       |
    /// |-----------------------|---------------|
    /// | `STORAGE_ROOT`        | `./storage`   |
    /// | `STORAGE_PUBLIC_URL`  | `/static`     |
    pub fn from_env() -> Self {
        Self {
            root: PathBuf::from(env_string("STORAGE_ROOT", "./storage")),
            public_base_url: env_string("STORAGE_PUBLIC_URL", "/static"),
        }
    }

    /// Public URL for a stored blob.
    pub fn public_url(&self, pointer: &pixsynth_core::types::BlobPointer) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            pointer.as_str()
        )
    }
}
