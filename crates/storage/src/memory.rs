//! In-memory blob store for tests and throwaway local runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use pixsynth_core::error::CoreError;
use pixsynth_core::ports::BlobStore;
use pixsynth_core::types::BlobPointer;
use tokio::sync::RwLock;

use crate::path::normalize;

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored paths in lexical order.
    pub async fn paths(&self) -> Vec<String> {
        self.blobs.read().await.keys().cloned().collect()
    }

    pub async fn contains(&self, logical_path: &str) -> bool {
        match normalize(logical_path) {
            Ok(path) => self.blobs.read().await.contains_key(&path),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: &[u8], logical_path: &str) -> Result<BlobPointer, CoreError> {
        let path = normalize(logical_path)?;
        self.blobs.write().await.insert(path.clone(), bytes.to_vec());
        Ok(BlobPointer::new(path))
    }

    async fn get(&self, pointer: &BlobPointer) -> Result<Vec<u8>, CoreError> {
        let path = normalize(pointer.as_str())?;
        self.blobs
            .read()
            .await
            .get(&path)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity: "Blob",
                id: path,
            })
    }

    async fn delete(&self, logical_path: &str) -> Result<bool, CoreError> {
        let path = normalize(logical_path)?;
        let prefix = format!("{path}/");
        let mut blobs = self.blobs.write().await;
        let before = blobs.len();
        blobs.retain(|k, _| *k != path && !k.starts_with(&prefix));
        Ok(blobs.len() != before)
    }
}
