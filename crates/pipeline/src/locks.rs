use std::collections::HashMap;
use std::sync::Arc;

use pixsynth_core::types::CharacterId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-character async mutexes. Mutations against one id run one at a
/// time; different ids never contend.
#[derive(Default, Clone)]
pub struct CharacterLocks {
    inner: Arc<Mutex<HashMap<CharacterId, Arc<Mutex<()>>>>>,
}

impl CharacterLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    pub async fn lock(&self, id: CharacterId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut map = self.inner.lock().await;
            // Drop entries nobody holds or waits on.
            map.retain(|key, m| *key == id || Arc::strong_count(m) > 1);
            map.entry(id).or_default().clone()
        };
        slot.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_id_serializes() {
        let locks = CharacterLocks::new();
        let id = uuid::Uuid::new_v4();
        let guard = locks.lock(id).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.lock(id).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_ids_do_not_block() {
        let locks = CharacterLocks::new();
        let _a = locks.lock(uuid::Uuid::new_v4()).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock(uuid::Uuid::new_v4())).await;
        assert!(b.is_ok());
    }
}
