//! Filesystem blob store rooted at a configured directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pixsynth_core::error::CoreError;
use pixsynth_core::ports::BlobStore;
use pixsynth_core::types::BlobPointer;

use crate::path::{normalize, resolve};

pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute filesystem location of a pointer.
    pub fn path_of(&self, pointer: &BlobPointer) -> Result<PathBuf, CoreError> {
        resolve(&self.root, pointer.as_str())
    }
}

fn storage_err(action: &str, path: &Path, e: std::io::Error) -> CoreError {
    CoreError::Storage(format!("Failed to {action} {}: {e}", path.display()))
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, bytes: &[u8], logical_path: &str) -> Result<BlobPointer, CoreError> {
        let normalized = normalize(logical_path)?;
        let target = self.root.join(&normalized);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_err("create directory", parent, e))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| storage_err("write", &target, e))?;

        tracing::debug!(path = %normalized, size = bytes.len(), "Stored blob");
        Ok(BlobPointer::new(normalized))
    }

    async fn get(&self, pointer: &BlobPointer) -> Result<Vec<u8>, CoreError> {
        let target = self.path_of(pointer)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CoreError::NotFound {
                entity: "Blob",
                id: pointer.to_string(),
            }),
            Err(e) => Err(storage_err("read", &target, e)),
        }
    }

    async fn delete(&self, logical_path: &str) -> Result<bool, CoreError> {
        let target = resolve(&self.root, logical_path)?;
        let metadata = match tokio::fs::metadata(&target).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(storage_err("inspect", &target, e)),
        };

        let result = if metadata.is_dir() {
            tokio::fs::remove_dir_all(&target).await
        } else {
            tokio::fs::remove_file(&target).await
        };
        result.map_err(|e| storage_err("delete", &target, e))?;

        tracing::debug!(path = logical_path, "Deleted blob path");
        Ok(true)
    }
}
