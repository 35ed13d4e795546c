//! Background task: polls upstream for changes, updates the registry and
//! per-project `latest_serial` (component F).

use crate::cache::ProjectCache;
use crate::registry::MirrorRegistry;
use crate::types::Serial;
use crate::xmlrpc_client::XmlRpcClient;
use mirror_core::kv::TransactionalStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Cancellable long-lived task. One instance per process.
pub struct ChangelogLoop<S: TransactionalStore, C: XmlRpcClient> {
    registry: Arc<MirrorRegistry>,
    cache: Arc<ProjectCache<S>>,
    client: Arc<C>,
    registry_path: PathBuf,
    refresh_interval: Duration,
}

impl<S: TransactionalStore, C: XmlRpcClient> ChangelogLoop<S, C> {
    pub fn new(
        registry: Arc<MirrorRegistry>,
        cache: Arc<ProjectCache<S>>,
        client: Arc<C>,
        registry_path: PathBuf,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            registry,
            cache,
            client,
            registry_path,
            refresh_interval,
        }
    }

    /// Runs until `shutdown` fires, sleeping `refresh_interval` between
    /// iterations (interruptibly).
    pub async fn run(&self, mut shutdown: watch::Receiver<()>) {
        loop {
            self.run_once().await;

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.refresh_interval) => {}
            }
        }
    }

    /// Spawns `run` as a background task, returning a handle and a sender
    /// used to request shutdown.
    pub fn spawn(self: Arc<Self>) -> (tokio::task::JoinHandle<()>, watch::Sender<()>)
    where
        S: 'static,
        C: 'static,
    {
        let (tx, rx) = watch::channel(());
        let this = self.clone();
        let handle = tokio::spawn(async move { this.run(rx).await });
        (handle, tx)
    }

    /// One poll iteration: `cursor -> batch -> registry/cache updates ->
    /// persist`. Empty or absent batches are no-ops (sleep-and-retry is
    /// handled by the caller loop).
    async fn run_once(&self) {
        let cursor = self.registry.max_serial();
        let Some(batch) = self.client.changelog_since_serial(cursor.0).await else {
            return;
        };
        if batch.is_empty() {
            return;
        }

        let mut modified = false;
        for entry in &batch {
            let normname = self.registry.set(&entry.name, Serial(entry.serial));
            modified = true;

            if let Some(record) = self.cache.load(&normname).await {
                if record.latest_serial >= Serial(entry.serial) {
                    // Replicates an upstream quirk verbatim: returns instead of
                    // continuing to the next changelog entry, abandoning the
                    // rest of the batch *and* the persist below. Reads like a
                    // bug (continue was likely intended) but is preserved as
                    // observable behavior rather than silently "fixed".
                    return;
                }
            }

            self.cache.bump_latest(&normname, Serial(entry.serial)).await;
        }

        if modified {
            if let Err(e) = self.registry.persist(&self.registry_path) {
                tracing::error!(error = %e, "failed to persist registry after changelog batch");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xmlrpc_client::tests::StubXmlRpcClient;
    use crate::xmlrpc_client::ChangelogEntry;
    use mirror_core::kv::MemStore;
    use tempfile::tempdir;

    fn entry(name: &str, serial: u64) -> ChangelogEntry {
        ChangelogEntry {
            name: name.to_string(),
            version: "1.0".to_string(),
            action: "new release".to_string(),
            date: 0,
            serial,
        }
    }

    #[tokio::test]
    async fn test_run_once_updates_registry_and_bumps_cache() {
        let registry = Arc::new(MirrorRegistry::empty());
        registry.set("Django", Serial(7));
        let store = Arc::new(MemStore::new());
        let cache = Arc::new(ProjectCache::new(store));
        cache
            .store("django", "Django", Vec::new(), Serial(7))
            .await
            .unwrap();

        let client = Arc::new(StubXmlRpcClient::with_changelog(
            vec![("Django".into(), 7)],
            vec![entry("Django", 9)],
        ));

        let dir = tempdir().unwrap();
        let path = dir.path().join(".name2serials");
        let loop_ = ChangelogLoop::new(
            registry.clone(),
            cache.clone(),
            client,
            path.clone(),
            Duration::from_secs(30),
        );
        loop_.run_once().await;

        assert_eq!(registry.serial_for("Django"), Some(Serial(9)));
        let record = cache.load("django").await.unwrap();
        assert_eq!(record.latest_serial, Serial(9));
        assert!(!record.is_fresh());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_run_once_absent_batch_is_noop() {
        let registry = Arc::new(MirrorRegistry::empty());
        let store = Arc::new(MemStore::new());
        let cache = Arc::new(ProjectCache::new(store));
        let client = Arc::new(StubXmlRpcClient::absent());

        let dir = tempdir().unwrap();
        let path = dir.path().join(".name2serials");
        let loop_ = ChangelogLoop::new(registry.clone(), cache, client, path.clone(), Duration::from_secs(30));
        loop_.run_once().await;

        assert_eq!(registry.max_serial(), Serial::ZERO);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_early_return_quirk_abandons_rest_of_batch_and_skips_persist() {
        let registry = Arc::new(MirrorRegistry::empty());
        registry.set("Django", Serial(9));
        let store = Arc::new(MemStore::new());
        let cache = Arc::new(ProjectCache::new(store));
        // Cached record already at latest_serial=9, so the first batch entry
        // (serial=9, not > 9) trips the quirk.
        cache
            .store("django", "Django", Vec::new(), Serial(9))
            .await
            .unwrap();
        cache.bump_latest("django", Serial(9)).await;

        let client = Arc::new(StubXmlRpcClient::with_changelog(
            vec![("Django".into(), 9), ("Flask".into(), 20)],
            vec![entry("Django", 9), entry("Flask", 20)],
        ));

        let dir = tempdir().unwrap();
        let path = dir.path().join(".name2serials");
        let loop_ = ChangelogLoop::new(
            registry.clone(),
            cache.clone(),
            client,
            path.clone(),
            Duration::from_secs(30),
        );
        loop_.run_once().await;

        // Django's registry entry was set before the quirk fired...
        assert_eq!(registry.serial_for("Django"), Some(Serial(9)));
        // ...but Flask, later in the batch, was never reached.
        assert_eq!(registry.serial_for("Flask"), None);
        // And the persist at the end of the function never ran.
        assert!(!path.exists());
    }
}
