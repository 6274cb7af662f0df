//! Resource listing and single-resource stores.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use uuid::Uuid;

use openshelf_client::{Resource, ResourceFilters};

use crate::backend::CatalogBackend;
use crate::state::{Snapshot, StateCell};

/// Synchronizes the filtered resource listing. The filter object is the
/// store's dependency: changing it by value triggers a refetch, setting
/// an equal value does not.
pub struct ResourceListStore {
    backend: Arc<dyn CatalogBackend>,
    filters: Mutex<ResourceFilters>,
    state: StateCell<Vec<Resource>>,
}

impl ResourceListStore {
    pub fn new(backend: Arc<dyn CatalogBackend>, filters: ResourceFilters) -> Self {
        Self {
            backend,
            filters: Mutex::new(filters),
            state: StateCell::new(Vec::new()),
        }
    }

    /// Replace the filter object, refetching when it actually changed.
    pub async fn set_filters(&self, filters: ResourceFilters) {
        {
            let mut current = self.filters.lock().expect("filter lock poisoned");
            if *current == filters {
                return;
            }
            *current = filters;
        }
        self.refetch().await;
    }

    pub async fn refetch(&self) {
        let generation = self.state.begin();
        let filters = self.filters.lock().expect("filter lock poisoned").clone();
        let outcome = self
            .backend
            .resources(&filters)
            .await
            .map_err(|e| e.to_string());
        if !self.state.complete(generation, outcome) {
            tracing::debug!(generation, "discarded stale resource listing");
        }
    }

    pub fn snapshot(&self) -> Snapshot<Vec<Resource>> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Vec<Resource>>> {
        self.state.subscribe()
    }
}

/// Synchronizes a single resource by id.
///
/// The id is optional: with `None` the store never issues a fetch and
/// stays at `loading = true` with no data until an id arrives.
pub struct ResourceStore {
    backend: Arc<dyn CatalogBackend>,
    id: Mutex<Option<Uuid>>,
    state: StateCell<Option<Resource>>,
}

impl ResourceStore {
    pub fn new(backend: Arc<dyn CatalogBackend>, id: Option<Uuid>) -> Self {
        Self {
            backend,
            id: Mutex::new(id),
            state: StateCell::new(None),
        }
    }

    /// Change the target id. `Some` refetches; `None` drops back to the
    /// waiting state and invalidates any fetch in flight.
    pub async fn set_id(&self, id: Option<Uuid>) {
        {
            let mut current = self.id.lock().expect("id lock poisoned");
            if *current == id {
                return;
            }
            *current = id;
        }
        match id {
            Some(_) => self.refetch().await,
            None => self.state.reset(None),
        }
    }

    /// Fetch the resource. A missing id means "do not fetch".
    pub async fn refetch(&self) {
        let Some(id) = *self.id.lock().expect("id lock poisoned") else {
            return;
        };
        let generation = self.state.begin();
        let outcome = self
            .backend
            .resource_by_id(id)
            .await
            .map(Some)
            .map_err(|e| e.to_string());
        if !self.state.complete(generation, outcome) {
            tracing::debug!(%id, generation, "discarded stale resource fetch");
        }
    }

    pub fn snapshot(&self) -> Snapshot<Option<Resource>> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Option<Resource>>> {
        self.state.subscribe()
    }
}
