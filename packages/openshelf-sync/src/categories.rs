//! Category list store.

use std::sync::Arc;

use tokio::sync::watch;

use openshelf_client::Category;

use crate::backend::CatalogBackend;
use crate::state::{Snapshot, StateCell};

/// Synchronizes the category list. Categories have no dependencies, so
/// the store is just fetch + snapshot.
pub struct CategoryStore {
    backend: Arc<dyn CatalogBackend>,
    state: StateCell<Vec<Category>>,
}

impl CategoryStore {
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self {
            backend,
            state: StateCell::new(Vec::new()),
        }
    }

    /// Fetch (or re-fetch) the list. Safe to call any number of times;
    /// overlapping calls resolve to the latest one.
    pub async fn refetch(&self) {
        let generation = self.state.begin();
        let outcome = self
            .backend
            .categories()
            .await
            .map_err(|e| e.to_string());
        if !self.state.complete(generation, outcome) {
            tracing::debug!(generation, "discarded stale category fetch");
        }
    }

    pub fn snapshot(&self) -> Snapshot<Vec<Category>> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Vec<Category>>> {
        self.state.subscribe()
    }
}
