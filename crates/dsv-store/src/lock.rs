//! Per-dataset writer locks.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use dsv_types::DatasetId;

/// One exclusive lock, released by dropping its [`KeyGuard`].
#[derive(Default)]
struct KeyLock {
    held: Mutex<bool>,
    released: Condvar,
}

/// Lazily created exclusive locks, one per dataset.
///
/// The table mutex is held only while looking up or inserting an entry, so
/// two threads never create distinct locks for the same dataset, and waiting
/// on one dataset never blocks lookups for another.
#[derive(Default)]
pub struct KeyLockTable {
    locks: Mutex<HashMap<DatasetId, Arc<KeyLock>>>,
}

impl KeyLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock for `id` is held, creating it if absent.
    ///
    /// There is no timeout: if the current holder never returns, this call
    /// never returns either.
    pub fn acquire(&self, id: DatasetId) -> KeyGuard {
        let lock = {
            let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(id).or_default())
        };

        let mut held = lock.held.lock().unwrap_or_else(PoisonError::into_inner);
        while *held {
            held = lock
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *held = true;
        drop(held);

        KeyGuard { id, lock }
    }

    /// Drop the table entry for a deleted dataset while `guard` still holds it.
    ///
    /// The entry is removed only when no other thread has taken a reference to
    /// it: waiters clone the lock under the table mutex, so a waiter that is
    /// already queued keeps the entry alive and later arrivals still queue
    /// behind it. Returns `true` if the entry was removed.
    pub fn forget(&self, guard: &KeyGuard) -> bool {
        let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let unshared = table
            .get(&guard.id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &guard.lock) && Arc::strong_count(entry) == 2);
        if unshared {
            table.remove(&guard.id);
        }
        unshared
    }

    /// Number of datasets with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for KeyLockTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyLockTable")
            .field("entries", &self.len())
            .finish()
    }
}

/// Holds one dataset's lock; releases it on drop, including during unwinding.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct KeyGuard {
    id: DatasetId,
    lock: Arc<KeyLock>,
}

impl KeyGuard {
    pub fn id(&self) -> DatasetId {
        self.id
    }

    /// Release the lock now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        let mut held = self.lock.held.lock().unwrap_or_else(PoisonError::into_inner);
        *held = false;
        drop(held);
        self.lock.released.notify_one();
    }
}

impl std::fmt::Debug for KeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGuard").field("id", &self.id).finish()
    }
}
