//! The seam between stores and the adapter layer.

use async_trait::async_trait;
use uuid::Uuid;

use openshelf_client::{Category, Favorite, Resource, ResourceFilters, Result, ShelfClient};

/// The adapter operations the stores consume.
///
/// Stores hold a trait object rather than the HTTP client directly so
/// their state machinery can be driven by an in-memory backend in tests.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn categories(&self) -> Result<Vec<Category>>;
    async fn resources(&self, filters: &ResourceFilters) -> Result<Vec<Resource>>;
    async fn resource_by_id(&self, id: Uuid) -> Result<Resource>;
    async fn favorites_for(&self, user_id: Uuid) -> Result<Vec<Favorite>>;
    async fn favorite_add(&self, user_id: Uuid, resource_id: Uuid) -> Result<Favorite>;
    async fn favorite_remove(&self, user_id: Uuid, resource_id: Uuid) -> Result<()>;
}

#[async_trait]
impl CatalogBackend for ShelfClient {
    async fn categories(&self) -> Result<Vec<Category>> {
        self.categories().get_all().await
    }

    async fn resources(&self, filters: &ResourceFilters) -> Result<Vec<Resource>> {
        self.resources().get_all(filters).await
    }

    async fn resource_by_id(&self, id: Uuid) -> Result<Resource> {
        self.resources().get_by_id(id).await
    }

    async fn favorites_for(&self, user_id: Uuid) -> Result<Vec<Favorite>> {
        self.favorites().for_user(user_id).await
    }

    async fn favorite_add(&self, user_id: Uuid, resource_id: Uuid) -> Result<Favorite> {
        self.favorites().add(user_id, resource_id).await
    }

    async fn favorite_remove(&self, user_id: Uuid, resource_id: Uuid) -> Result<()> {
        self.favorites().remove(user_id, resource_id).await
    }
}
