//! Per-evidence mutual exclusion.
//!
//! Entries live only while someone holds or waits on them: the last
//! [`KeyedGuard`] to release an id removes its mutex from the map.

use std::sync::Arc;

use dashmap::DashMap;
use exhibit_core::EvidenceId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per evidence id, created on first use.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<EvidenceId, Arc<Mutex<()>>>,
}

/// Exclusive access to one evidence id. Released when dropped.
#[derive(Debug)]
pub struct KeyedGuard<'a> {
    owner: &'a KeyedLocks,
    id: EvidenceId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold a clone of the Arc, so a count of one means only the
        // map still refers to this mutex.
        self.owner
            .locks
            .remove_if(&self.id, |_, m| Arc::strong_count(m) == 1);
    }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    pub async fn lock(&self, id: &EvidenceId) -> KeyedGuard<'_> {
        let mutex = self
            .locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        KeyedGuard {
            owner: self,
            id: id.clone(),
            guard: Some(guard),
        }
    }

    /// Drop mutexes nobody holds or waits on. Only needed after a waiter
    /// gave up before acquiring, e.g. on a deadline.
    pub fn prune(&self) {
        self.locks.retain(|_, m| Arc::strong_count(m) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
