//! Per-project cache: persists and loads `{serial, latest_serial, entries}`
//! records via the external transactional key-value store (component D).

use crate::error::Result;
use crate::types::{Entry, ProjectCacheRecord, Serial};
use mirror_core::error::CoreError;
use mirror_core::kv::TransactionalStore;
use std::sync::Arc;

fn cache_key(normalized_name: &str) -> String {
    format!("PYPILINKS:{normalized_name}")
}

/// Per-project cache built on any `TransactionalStore`.
pub struct ProjectCache<S: TransactionalStore> {
    store: Arc<S>,
}

impl<S: TransactionalStore> ProjectCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Transactional read by normalized name.
    pub async fn load(&self, normalized_name: &str) -> Option<ProjectCacheRecord> {
        let raw = self.store.get(&cache_key(normalized_name)).await?;
        serde_json::from_slice(&raw).ok()
    }

    /// Writes `{serial, latest_serial=serial, entrylist, projectname}` under
    /// the normalized key.
    pub async fn store(
        &self,
        normalized_name: &str,
        projectname: &str,
        entries: Vec<Entry>,
        serial: Serial,
    ) -> Result<()> {
        let record = ProjectCacheRecord::new(projectname, serial, entries);
        let bytes = serde_json::to_vec(&record).map_err(CoreError::from)?;
        self.store.set(&cache_key(normalized_name), bytes).await;
        Ok(())
    }

    /// Read-modify-write: if `record.latest_serial < serial`, sets it to
    /// `serial`; otherwise a no-op. Silently does nothing if no record is
    /// cached yet (there is nothing to bump).
    pub async fn bump_latest(&self, normalized_name: &str, serial: Serial) {
        let Some(raw) = self.store.get(&cache_key(normalized_name)).await else {
            return;
        };
        let Ok(mut record) = serde_json::from_slice::<ProjectCacheRecord>(&raw) else {
            return;
        };
        if record.latest_serial < serial {
            record.latest_serial = serial;
            if let Ok(bytes) = serde_json::to_vec(&record) {
                self.store.set(&cache_key(normalized_name), bytes).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::kv::MemStore;

    fn sample_entries() -> Vec<Entry> {
        vec![Entry {
            relpath: "d/j/Django-3.0.tar.gz".into(),
            digest: Some("abc".into()),
            keyname: "k1".into(),
        }]
    }

    #[tokio::test]
    async fn test_store_then_load_is_fresh() {
        let cache = ProjectCache::new(Arc::new(MemStore::new()));
        cache
            .store("django", "Django", sample_entries(), Serial(7))
            .await
            .unwrap();

        let record = cache.load("django").await.unwrap();
        assert!(record.is_fresh());
        assert_eq!(record.serial, Serial(7));
        assert_eq!(record.entrylist, sample_entries());
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let cache: ProjectCache<MemStore> = ProjectCache::new(Arc::new(MemStore::new()));
        assert!(cache.load("nonesuch").await.is_none());
    }

    #[tokio::test]
    async fn test_bump_latest_marks_stale() {
        let cache = ProjectCache::new(Arc::new(MemStore::new()));
        cache
            .store("django", "Django", sample_entries(), Serial(7))
            .await
            .unwrap();

        cache.bump_latest("django", Serial(9)).await;

        let record = cache.load("django").await.unwrap();
        assert!(!record.is_fresh());
        assert_eq!(record.latest_serial, Serial(9));
    }

    #[tokio::test]
    async fn test_bump_latest_never_lowers() {
        let cache = ProjectCache::new(Arc::new(MemStore::new()));
        cache
            .store("django", "Django", sample_entries(), Serial(7))
            .await
            .unwrap();

        cache.bump_latest("django", Serial(9)).await;
        cache.bump_latest("django", Serial(8)).await;

        let record = cache.load("django").await.unwrap();
        assert_eq!(record.latest_serial, Serial(9));
    }

    #[tokio::test]
    async fn test_bump_latest_on_missing_record_is_noop() {
        let cache: ProjectCache<MemStore> = ProjectCache::new(Arc::new(MemStore::new()));
        cache.bump_latest("django", Serial(9)).await;
        assert!(cache.load("django").await.is_none());
    }
}
