//! The transactional key-value store abstraction the mirror's per-project
//! cache is built on.
//!
//! The system this crate mirrors assumes an external, replicated,
//! multi-version store: every write is assigned a monotonically increasing
//! serial, and replicas can block until a given serial has been applied
//! locally before re-reading. `TransactionalStore` captures exactly that
//! contract; `MemStore` is the in-memory reference implementation used by
//! every test in this workspace and by the `mirror-server` binary. It is
//! not a production multi-version store — swapping in a real one means
//! implementing this trait against it, nothing above this layer changes.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

/// A store that assigns a monotone serial to every write and lets callers
/// wait for a given serial to become visible.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    /// Reads the current value stored under `key`, if any.
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Writes `value` under `key` as a single committed transaction,
    /// returning the serial assigned to this write.
    async fn set(&self, key: &str, value: Vec<u8>) -> u64;

    /// The highest serial committed so far.
    fn current_serial(&self) -> u64;

    /// Blocks until `current_serial() >= serial`, the mechanism a replica
    /// uses to catch up to a serial it was told about out-of-band (e.g. via
    /// an `X-DEVPI-SERIAL` response header) before re-reading.
    async fn wait_for_serial(&self, serial: u64);
}

/// In-memory reference implementation of `TransactionalStore`.
///
/// Every `set` bumps a single global serial counter and notifies any task
/// blocked in `wait_for_serial`. This is simpler than true MVCC — reads
/// always see the latest committed value rather than a point-in-time
/// snapshot — which is sufficient for the per-project cache, where every
/// record is read and written under its own key.
pub struct MemStore {
    data: DashMap<String, Vec<u8>>,
    serial: AtomicU64,
    notify: Notify,
}

impl MemStore {
    /// Creates an empty store with serial `0`.
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            serial: AtomicU64::new(0),
            notify: Notify::new(),
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionalStore for MemStore {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.data.get(key).map(|entry| entry.value().clone())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> u64 {
        self.data.insert(key.to_string(), value);
        let new_serial = self.serial.fetch_add(1, Ordering::SeqCst) + 1;
        self.notify.notify_waiters();
        new_serial
    }

    fn current_serial(&self) -> u64 {
        self.serial.load(Ordering::SeqCst)
    }

    async fn wait_for_serial(&self, serial: u64) {
        loop {
            if self.current_serial() >= serial {
                return;
            }
            let notified = self.notify.notified();
            if self.current_serial() >= serial {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemStore::new();
        store.set("key", b"value".to_vec()).await;
        assert_eq!(store.get("key").await, Some(b"value".to_vec()));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = MemStore::new();
        assert_eq!(store.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_set_bumps_serial_monotonically() {
        let store = MemStore::new();
        assert_eq!(store.current_serial(), 0);
        let s1 = store.set("a", vec![1]).await;
        let s2 = store.set("b", vec![2]).await;
        assert_eq!(s1, 1);
        assert_eq!(s2, 2);
        assert_eq!(store.current_serial(), 2);
    }

    #[tokio::test]
    async fn test_wait_for_serial_already_satisfied_returns_immediately() {
        let store = MemStore::new();
        store.set("a", vec![1]).await;
        tokio::time::timeout(Duration::from_millis(100), store.wait_for_serial(1))
            .await
            .expect("should not block");
    }

    #[tokio::test]
    async fn test_wait_for_serial_unblocks_on_future_write() {
        let store = Arc::new(MemStore::new());
        let waiter_store = Arc::clone(&store);

        let waiter = tokio::spawn(async move {
            waiter_store.wait_for_serial(1).await;
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        store.set("a", vec![1]).await;

        tokio::time::timeout(Duration::from_millis(200), waiter)
            .await
            .expect("waiter should unblock after write")
            .unwrap();
    }
}
