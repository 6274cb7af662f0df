//! Favorites store with mutation actions.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use uuid::Uuid;

use openshelf_client::{Favorite, ShelfError};

use crate::backend::CatalogBackend;
use crate::state::{Snapshot, StateCell};

/// Synchronizes a user's favorites and exposes add/remove actions.
///
/// Mutations take the simple route: run the adapter call, then refetch
/// the whole list so local state mirrors the service. No optimistic
/// update, no partial patch.
pub struct FavoriteStore {
    backend: Arc<dyn CatalogBackend>,
    user_id: Mutex<Option<Uuid>>,
    state: StateCell<Vec<Favorite>>,
}

impl FavoriteStore {
    pub fn new(backend: Arc<dyn CatalogBackend>, user_id: Option<Uuid>) -> Self {
        Self {
            backend,
            user_id: Mutex::new(user_id),
            state: StateCell::new(Vec::new()),
        }
    }

    /// Change the owning user. `Some` refetches; `None` (signed out)
    /// drops back to the waiting state.
    pub async fn set_user(&self, user_id: Option<Uuid>) {
        {
            let mut current = self.user_id.lock().expect("user lock poisoned");
            if *current == user_id {
                return;
            }
            *current = user_id;
        }
        match user_id {
            Some(_) => self.refetch().await,
            None => self.state.reset(Vec::new()),
        }
    }

    /// Fetch the favorites list. A missing user id means "do not fetch".
    pub async fn refetch(&self) {
        let Some(user_id) = *self.user_id.lock().expect("user lock poisoned") else {
            return;
        };
        let generation = self.state.begin();
        let outcome = self
            .backend
            .favorites_for(user_id)
            .await
            .map_err(|e| e.to_string());
        if !self.state.complete(generation, outcome) {
            tracing::debug!(%user_id, generation, "discarded stale favorites fetch");
        }
    }

    /// Favorite a resource, then resync the list. A duplicate add
    /// surfaces the service's `Conflict` to the caller and in the error
    /// state; the refetched list still holds exactly one entry for the
    /// pair.
    pub async fn add(&self, resource_id: Uuid) -> Result<(), ShelfError> {
        let Some(user_id) = *self.user_id.lock().expect("user lock poisoned") else {
            return Err(ShelfError::Validation("no user to favorite for".into()));
        };
        let outcome = self.backend.favorite_add(user_id, resource_id).await;
        self.refetch().await;
        match outcome {
            Ok(_) => Ok(()),
            Err(err) => {
                self.state.record_error(err.to_string());
                Err(err)
            }
        }
    }

    /// Unfavorite a resource, then resync the list. Removing an absent
    /// favorite is not an error, so calling this twice settles in the
    /// same state.
    pub async fn remove(&self, resource_id: Uuid) -> Result<(), ShelfError> {
        let Some(user_id) = *self.user_id.lock().expect("user lock poisoned") else {
            return Err(ShelfError::Validation("no user to unfavorite for".into()));
        };
        let outcome = self.backend.favorite_remove(user_id, resource_id).await;
        self.refetch().await;
        match outcome {
            Ok(()) => Ok(()),
            Err(err) => {
                self.state.record_error(err.to_string());
                Err(err)
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot<Vec<Favorite>> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Vec<Favorite>>> {
        self.state.subscribe()
    }
}
