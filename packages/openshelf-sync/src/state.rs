//! Shared state machinery for the per-entity stores.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

/// One observable state of a store: `idle/loading → ready | errored`.
///
/// `data` keeps its previous value through a failed fetch so views can
/// keep rendering the last good snapshot alongside the error.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
    /// Fetch generation that produced this snapshot. Diagnostic only.
    pub generation: u64,
}

/// Snapshot holder with a fetch-generation guard.
///
/// Every fetch is stamped with a generation on start; a completion whose
/// generation has been superseded (by a newer fetch or a dependency
/// reset) is discarded instead of overwriting newer state. Requests are
/// not cancelled — only their right to write back expires.
pub(crate) struct StateCell<T> {
    tx: watch::Sender<Snapshot<T>>,
    generation: AtomicU64,
}

impl<T: Clone> StateCell<T> {
    /// A cell that has not completed any fetch yet: empty data,
    /// `loading = true`.
    pub(crate) fn new(empty: T) -> Self {
        let (tx, _) = watch::channel(Snapshot {
            data: empty,
            loading: true,
            error: None,
            generation: 0,
        });
        Self {
            tx,
            generation: AtomicU64::new(0),
        }
    }

    /// Enter `loading` and claim the next generation.
    pub(crate) fn begin(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_modify(|snap| snap.loading = true);
        generation
    }

    /// Land a fetch outcome. Returns `false` (and changes nothing) when
    /// the generation has been superseded.
    pub(crate) fn complete(&self, generation: u64, outcome: Result<T, String>) -> bool {
        if generation != self.generation.load(Ordering::SeqCst) {
            return false;
        }
        self.tx.send_modify(|snap| {
            snap.loading = false;
            snap.generation = generation;
            match outcome {
                Ok(data) => {
                    snap.data = data;
                    snap.error = None;
                }
                Err(message) => snap.error = Some(message),
            }
        });
        true
    }

    /// Record a mutation failure without touching data or generation.
    pub(crate) fn record_error(&self, message: String) {
        self.tx.send_modify(|snap| {
            snap.loading = false;
            snap.error = Some(message);
        });
    }

    /// Drop back to the pre-fetch state (used when a required dependency
    /// goes away). Invalidates any fetch still in flight.
    pub(crate) fn reset(&self, empty: T) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_replace(Snapshot {
            data: empty,
            loading: true,
            error: None,
            generation,
        });
    }

    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.tx.subscribe()
    }
}
