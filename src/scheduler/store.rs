//! The single "latest snapshot" reference shared between the scheduler and readers.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::domain::Snapshot;

/// Holds the most recently published snapshot.
///
/// Snapshots are immutable; publishing swaps the whole `Arc`, so readers
/// either see the previous snapshot or the new one, never a mix.
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
    subscribers: Mutex<Vec<Sender<Arc<Snapshot>>>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    /// A store holding the sequence-0 placeholder.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn latest(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn sequence(&self) -> u64 {
        self.latest().sequence
    }

    /// Replace the latest snapshot and notify subscribers.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *guard = Arc::clone(&snapshot);
        }

        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(Arc::clone(&snapshot)).is_ok());
        snapshot
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> Receiver<Arc<Snapshot>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }
}
