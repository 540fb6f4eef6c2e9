//! Holder of the current [`Snapshot`].
//!
//! The store owns a single `Arc<Snapshot>` behind a `watch` channel. Readers
//! clone the `Arc` and drop the borrow straight away, so a reader never waits
//! on the network or the decoder, and never sees a half-built snapshot.

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::Snapshot;

#[derive(Debug)]
pub struct SnapshotStore {
    tx: watch::Sender<Arc<Snapshot>>,
}

impl SnapshotStore {
    /// A store holding [`Snapshot::empty`].
    pub fn new() -> Self {
        Self::with_snapshot(Snapshot::empty())
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(snapshot));
        Self { tx }
    }

    /// The latest committed snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        self.tx.borrow().clone()
    }

    /// Replaces the visible snapshot in one swap.
    pub fn commit(&self, snapshot: Snapshot) {
        self.tx.send_replace(Arc::new(snapshot));
    }

    /// Keeps the current records but flags them as coming from before a
    /// failed cycle.
    pub fn mark_error(&self, error: impl Into<String>, attempted_at: i64) {
        let error = error.into();
        self.tx
            .send_modify(|current| *current = Arc::new(current.failed(error, attempted_at)));
    }

    /// Receiver that is notified after every commit.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
