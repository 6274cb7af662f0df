//! Store behavior against an in-memory backend.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use openshelf_client::{
    Category, ClientConfig, DifficultyLevel, Favorite, Resource, ResourceFilters, ResourceType,
    Result, ShelfClient, ShelfError,
};
use openshelf_sync::{
    CatalogBackend, CategoryStore, FavoriteStore, ResourceListStore, ResourceStore, SessionStore,
};

fn make_category(name: &str) -> Category {
    Category {
        id: Uuid::new_v4(),
        name: name.into(),
        color: "#3d405b".into(),
        icon: "book".into(),
        created_at: Some(Utc::now()),
    }
}

fn make_resource(title: &str) -> Resource {
    Resource {
        id: Uuid::new_v4(),
        title: title.into(),
        description: format!("{title} description"),
        author: "Author".into(),
        resource_type: ResourceType::Article,
        difficulty_level: DifficultyLevel::Beginner,
        tags: vec![],
        url: None,
        views_count: 0,
        downloads_count: 0,
        is_featured: false,
        is_published: true,
        category_id: None,
        created_at: Some(Utc::now()),
        category: None,
    }
}

#[derive(Default)]
struct FakeBackend {
    categories: Mutex<Vec<Category>>,
    resources: Mutex<Vec<Resource>>,
    favorites: Mutex<Vec<Favorite>>,
    fail_categories: Mutex<bool>,
    listing_calls: AtomicUsize,
    /// Per-call scripts for the listing endpoint, consumed in call order.
    listing_delays: Mutex<VecDeque<Duration>>,
    listing_results: Mutex<VecDeque<Vec<Resource>>>,
}

impl FakeBackend {
    fn with_resources(resources: Vec<Resource>) -> Arc<Self> {
        let backend = Self::default();
        *backend.resources.lock().unwrap() = resources;
        Arc::new(backend)
    }
}

#[async_trait]
impl CatalogBackend for FakeBackend {
    async fn categories(&self) -> Result<Vec<Category>> {
        if *self.fail_categories.lock().unwrap() {
            return Err(ShelfError::Api {
                status: 500,
                message: "backend down".into(),
            });
        }
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn resources(&self, _filters: &ResourceFilters) -> Result<Vec<Resource>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.listing_delays.lock().unwrap().pop_front();
        let scripted = self.listing_results.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match scripted {
            Some(result) => Ok(result),
            None => Ok(self.resources.lock().unwrap().clone()),
        }
    }

    async fn resource_by_id(&self, id: Uuid) -> Result<Resource> {
        self.resources
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(ShelfError::NotFound)
    }

    async fn favorites_for(&self, user_id: Uuid) -> Result<Vec<Favorite>> {
        Ok(self
            .favorites
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn favorite_add(&self, user_id: Uuid, resource_id: Uuid) -> Result<Favorite> {
        let mut favorites = self.favorites.lock().unwrap();
        if favorites
            .iter()
            .any(|f| f.user_id == user_id && f.resource_id == resource_id)
        {
            return Err(ShelfError::Conflict(
                "duplicate key value violates unique constraint".into(),
            ));
        }
        let favorite = Favorite {
            id: Uuid::new_v4(),
            user_id,
            resource_id,
            created_at: Some(Utc::now()),
            resource: None,
        };
        favorites.push(favorite.clone());
        Ok(favorite)
    }

    async fn favorite_remove(&self, user_id: Uuid, resource_id: Uuid) -> Result<()> {
        // Deleting an absent row is a successful delete
        self.favorites
            .lock()
            .unwrap()
            .retain(|f| !(f.user_id == user_id && f.resource_id == resource_id));
        Ok(())
    }
}

#[tokio::test]
async fn category_store_transitions_loading_to_ready() {
    let backend = Arc::new(FakeBackend::default());
    *backend.categories.lock().unwrap() = vec![make_category("Math"), make_category("Science")];

    let store = CategoryStore::new(backend);
    let initial = store.snapshot();
    assert!(initial.loading);
    assert!(initial.data.is_empty());

    store.refetch().await;
    let snap = store.snapshot();
    assert!(!snap.loading);
    assert!(snap.error.is_none());
    assert_eq!(snap.data.len(), 2);
}

#[tokio::test]
async fn category_store_surfaces_errors_and_recovers() {
    let backend = Arc::new(FakeBackend::default());
    *backend.categories.lock().unwrap() = vec![make_category("Math")];
    *backend.fail_categories.lock().unwrap() = true;

    let store = CategoryStore::new(backend.clone());
    store.refetch().await;
    let errored = store.snapshot();
    assert!(!errored.loading);
    assert!(errored.error.as_deref().unwrap().contains("backend down"));

    // A later refetch clears the error
    *backend.fail_categories.lock().unwrap() = false;
    store.refetch().await;
    let recovered = store.snapshot();
    assert!(recovered.error.is_none());
    assert_eq!(recovered.data.len(), 1);
}

#[tokio::test]
async fn resource_store_without_id_never_fetches() {
    let resource = make_resource("Intro to Graphs");
    let backend = FakeBackend::with_resources(vec![resource.clone()]);

    let store = ResourceStore::new(backend, None);
    store.refetch().await;

    let waiting = store.snapshot();
    assert!(waiting.loading);
    assert!(waiting.data.is_none());

    store.set_id(Some(resource.id)).await;
    let loaded = store.snapshot();
    assert!(!loaded.loading);
    assert_eq!(loaded.data.unwrap().title, "Intro to Graphs");
}

#[tokio::test]
async fn resource_store_reports_not_found() {
    let backend = FakeBackend::with_resources(vec![]);
    let store = ResourceStore::new(backend, Some(Uuid::new_v4()));
    store.refetch().await;

    let snap = store.snapshot();
    assert!(!snap.loading);
    assert!(snap.data.is_none());
    assert!(snap.error.as_deref().unwrap().contains("not found"));
}

#[tokio::test]
async fn clearing_the_id_drops_back_to_waiting() {
    let resource = make_resource("Intro to Graphs");
    let backend = FakeBackend::with_resources(vec![resource.clone()]);

    let store = ResourceStore::new(backend, Some(resource.id));
    store.refetch().await;
    assert!(store.snapshot().data.is_some());

    store.set_id(None).await;
    let snap = store.snapshot();
    assert!(snap.loading);
    assert!(snap.data.is_none());
    assert!(snap.error.is_none());
}

#[tokio::test]
async fn equal_filters_do_not_refetch() {
    let backend = FakeBackend::with_resources(vec![make_resource("A")]);
    let store = ResourceListStore::new(backend.clone(), ResourceFilters::default());

    store.refetch().await;
    assert_eq!(backend.listing_calls.load(Ordering::SeqCst), 1);

    store.set_filters(ResourceFilters::default()).await;
    assert_eq!(backend.listing_calls.load(Ordering::SeqCst), 1);

    store
        .set_filters(ResourceFilters {
            search: Some("graphs".into()),
            ..Default::default()
        })
        .await;
    assert_eq!(backend.listing_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn stale_listing_response_is_discarded() {
    let backend = Arc::new(FakeBackend::default());
    {
        let mut delays = backend.listing_delays.lock().unwrap();
        delays.push_back(Duration::from_millis(80));
        delays.push_back(Duration::from_millis(0));
    }
    {
        let mut results = backend.listing_results.lock().unwrap();
        results.push_back(vec![make_resource("stale")]);
        results.push_back(vec![make_resource("fresh")]);
    }

    let store = Arc::new(ResourceListStore::new(
        backend.clone(),
        ResourceFilters::default(),
    ));

    // First fetch is slow; a second one overtakes it.
    let slow = {
        let store = store.clone();
        tokio::spawn(async move { store.refetch().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    store.refetch().await;
    slow.await.unwrap();

    let snap = store.snapshot();
    assert_eq!(snap.data.len(), 1);
    assert_eq!(snap.data[0].title, "fresh");
    assert!(!snap.loading);
}

#[tokio::test]
async fn favorites_resync_after_each_mutation() {
    let user = Uuid::new_v4();
    let resource = make_resource("Intro to Graphs");
    let backend = FakeBackend::with_resources(vec![resource.clone()]);

    let store = FavoriteStore::new(backend.clone(), Some(user));
    store.refetch().await;
    assert!(store.snapshot().data.is_empty());

    store.add(resource.id).await.unwrap();
    assert_eq!(store.snapshot().data.len(), 1);

    store.remove(resource.id).await.unwrap();
    assert!(store.snapshot().data.is_empty());
}

#[tokio::test]
async fn removing_twice_settles_in_the_same_state() {
    let user = Uuid::new_v4();
    let resource = make_resource("Intro to Graphs");
    let backend = FakeBackend::with_resources(vec![resource.clone()]);

    let store = FavoriteStore::new(backend, Some(user));
    store.refetch().await;
    store.add(resource.id).await.unwrap();

    store.remove(resource.id).await.unwrap();
    store.remove(resource.id).await.unwrap();

    let snap = store.snapshot();
    assert!(snap.data.is_empty());
    assert!(snap.error.is_none());
}

#[tokio::test]
async fn duplicate_add_surfaces_conflict_with_one_entry() {
    let user = Uuid::new_v4();
    let resource = make_resource("Intro to Graphs");
    let backend = FakeBackend::with_resources(vec![resource.clone()]);

    let store = FavoriteStore::new(backend, Some(user));
    store.refetch().await;

    store.add(resource.id).await.unwrap();
    let second = store.add(resource.id).await;
    assert!(matches!(second, Err(ShelfError::Conflict(_))));

    // The list resynced through both calls: exactly one entry, and the
    // conflict is visible in the error state.
    let snap = store.snapshot();
    assert_eq!(snap.data.len(), 1);
    assert!(snap.error.as_deref().unwrap().contains("conflict"));
}

#[tokio::test]
async fn favorites_without_user_never_fetch_and_reject_mutations() {
    let resource = make_resource("Intro to Graphs");
    let backend = FakeBackend::with_resources(vec![resource.clone()]);

    let store = FavoriteStore::new(backend, None);
    store.refetch().await;
    assert!(store.snapshot().loading);

    let result = store.add(resource.id).await;
    assert!(matches!(result, Err(ShelfError::Validation(_))));
}

#[tokio::test]
async fn session_store_seeds_signed_out() {
    // No session on the bridge: the seed resolves locally to "nobody
    // signed in" without touching the network.
    let client = ShelfClient::new(ClientConfig::new("https://example.test", "anon"));
    let store = SessionStore::attach(client.auth()).await;

    let snap = store.snapshot();
    assert!(!snap.loading);
    assert!(snap.data.is_none());
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn subscribers_observe_the_ready_transition() {
    let backend = Arc::new(FakeBackend::default());
    *backend.categories.lock().unwrap() = vec![make_category("Math")];

    let store = CategoryStore::new(backend);
    let mut rx = store.subscribe();

    store.refetch().await;
    // Drain to the latest value; watch coalesces intermediate states.
    let snap = rx.borrow_and_update().clone();
    assert!(!snap.loading);
    assert_eq!(snap.data.len(), 1);
}
