use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes mutations that target the same task id.
///
/// Different ids proceed concurrently; a second toggle of the same id waits
/// until the first one has settled.
#[derive(Default)]
pub struct MutationLocks {
    inner: DashMap<String, Arc<Mutex<()>>>,
}

impl MutationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let slot = self
            .inner
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        slot.lock_owned().await
    }

    /// Acquire several ids in sorted order so that overlapping batches cannot deadlock.
    pub async fn acquire_many(&self, ids: &[String]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted: Vec<&String> = ids.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for id in sorted {
            guards.push(self.acquire(id).await);
        }
        guards
    }

    /// Drop the slot for an id that no longer exists.
    /// Waiters already holding a clone of the slot are unaffected.
    pub fn forget(&self, id: &str) {
        self.inner.remove(id);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_id_is_serialized() {
        let locks = Arc::new(MutationLocks::new());
        let guard = locks.acquire("a").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire("a").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_ids_do_not_block() {
        let locks = MutationLocks::new();
        let _a = locks.acquire("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn acquire_many_dedups_and_forget_removes_slot() {
        let locks = MutationLocks::new();
        let guards = locks
            .acquire_many(&["b".to_string(), "a".to_string(), "b".to_string()])
            .await;
        assert_eq!(guards.len(), 2);
        drop(guards);

        locks.forget("a");
        assert_eq!(locks.len(), 1);
    }
}
