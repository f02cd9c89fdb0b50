//! Shared Key-Value Store
//!
//! One `HashMap` guarded by a single `RwLock`. Every connection holds an
//! `Arc<Store>`; any number of `get` calls run together, a `set` excludes
//! everyone else for the duration of one map insert.
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │                  Store                    │
//! │  ┌─────────────────────────────────────┐  │
//! │  │ RwLock<HashMap<Bytes, Bytes>>       │  │
//! │  └─────────────────────────────────────┘  │
//! │  gets: AtomicU64     sets: AtomicU64      │
//! └───────────────────────────────────────────┘
//!         ▲            ▲            ▲
//!     Session 1    Session 2    Session N
//! ```

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Snapshot of store counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub keys: usize,
    pub gets: u64,
    pub sets: u64,
}

/// The key-value table shared by all connections.
///
/// Neither operation can fail. A panic while holding the lock cannot leave
/// the map half-updated (each critical section is a single `HashMap` call),
/// so a poisoned lock is simply taken over.
///
/// # Example
///
/// ```
/// use linekv::storage::Store;
/// use bytes::Bytes;
///
/// let store = Store::new();
/// store.set(Bytes::from("color"), Bytes::from("blue"));
/// assert_eq!(store.get(b"color"), Bytes::from("blue"));
/// assert!(store.get(b"missing").is_empty());
/// ```
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<HashMap<Bytes, Bytes>>,
    gets: AtomicU64,
    sets: AtomicU64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Bytes, Bytes>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Bytes, Bytes>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the value stored under `key`, or an empty value if unset.
    pub fn get(&self, key: &[u8]) -> Bytes {
        self.gets.fetch_add(1, Ordering::Relaxed);
        // Bytes::clone only bumps a refcount, so the read lock is held briefly.
        self.read().get(key).cloned().unwrap_or_default()
    }

    /// Creates or overwrites the entry for `key`.
    pub fn set(&self, key: Bytes, value: Bytes) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        self.write().insert(key, value);
    }

    /// Returns true if `key` has ever been set.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            keys: self.len(),
            gets: self.gets.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
        }
    }
}
