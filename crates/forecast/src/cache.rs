use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::snapshot::ForecastSnapshot;

/// Holds the most recently published [`ForecastSnapshot`].
///
/// Publication is a single atomic replace of an `Arc`, so readers always see
/// a whole cycle, never a mix of two. Clones share the same cache.
#[derive(Debug, Clone)]
pub struct ForecastCache {
    tx: Arc<watch::Sender<Arc<ForecastSnapshot>>>,
    published: Arc<AtomicU64>,
}

impl ForecastCache {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(ForecastSnapshot::empty()));
        Self {
            tx: Arc::new(tx),
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publish a finished cycle, stamping it with the next sequence number.
    pub fn publish(&self, mut snapshot: ForecastSnapshot) -> u64 {
        let cycle = self.published.fetch_add(1, Ordering::SeqCst) + 1;
        snapshot.cycle = cycle;
        self.tx.send_replace(Arc::new(snapshot));
        cycle
    }

    pub fn latest(&self) -> Arc<ForecastSnapshot> {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every publication or clear.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ForecastSnapshot>> {
        self.tx.subscribe()
    }

    /// Replace the published snapshot with an empty one.
    pub fn clear(&self) {
        self.tx.send_replace(Arc::new(ForecastSnapshot::empty()));
    }

    /// Number of snapshots published since construction.
    pub fn published_cycles(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }
}

impl Default for ForecastCache {
    fn default() -> Self {
        Self::new()
    }
}
