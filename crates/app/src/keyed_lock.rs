//! Per-key async mutual exclusion.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes work on the same key while letting different keys proceed
/// concurrently. Slots nobody holds or waits for are dropped on the next
/// acquisition.
pub struct KeyedLock<K> {
    slots: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for KeyedLock<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Copy> KeyedLock<K> {
    /// Wait until `key` is free and hold it until the guard is dropped.
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(slots.entry(key).or_default())
        };
        slot.lock_owned().await
    }

    /// Number of keys currently held or awaited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| Arc::strong_count(slot) > 1)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn should_serialize_same_key() {
        let lock = Arc::new(KeyedLock::default());
        let guard = lock.acquire(1).await;

        let contender = {
            let lock = Arc::clone(&lock);
            tokio::spawn(async move {
                let _guard = lock.acquire(1).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn should_not_block_other_keys() {
        let lock = KeyedLock::default();
        let _first = lock.acquire(1).await;
        let _second = lock.acquire(2).await;
        assert_eq!(lock.len(), 2);
    }

    #[tokio::test]
    async fn should_release_slot_when_guard_dropped() {
        let lock = KeyedLock::default();
        drop(lock.acquire(7).await);
        assert!(lock.is_empty());
    }
}
