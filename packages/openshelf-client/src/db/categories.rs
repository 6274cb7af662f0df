//! Category reads and writes.

use uuid::Uuid;

use crate::error::{Result, ShelfError};
use crate::query::PostgrestRequest;
use crate::types::{Category, CategoryChange, NewCategory};
use crate::ShelfClient;

/// Adapter facade for the `categories` table.
pub struct Categories<'a> {
    pub(crate) client: &'a ShelfClient,
}

impl Categories<'_> {
    /// All categories, ordered by name ascending. Collation is the
    /// service's.
    pub async fn get_all(&self) -> Result<Vec<Category>> {
        let req = PostgrestRequest::get("categories")
            .select("*")
            .order_asc("name");
        self.client.execute(req).await
    }

    /// Single category by id; `NotFound` when no row matches.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Category> {
        let req = PostgrestRequest::get("categories")
            .select("*")
            .eq("id", id)
            .single();
        self.client.execute(req).await
    }

    pub async fn create(&self, new: NewCategory) -> Result<Category> {
        let body = serde_json::to_value(&new).map_err(|e| ShelfError::Parse(e.to_string()))?;
        let req = PostgrestRequest::insert("categories", body)
            .select("*")
            .returning()
            .single();
        tracing::info!(name = %new.name, "creating category");
        self.client.execute(req).await
    }

    pub async fn update(&self, id: Uuid, change: CategoryChange) -> Result<Category> {
        let body = serde_json::to_value(&change).map_err(|e| ShelfError::Parse(e.to_string()))?;
        let req = PostgrestRequest::update("categories", body)
            .eq("id", id)
            .select("*")
            .returning()
            .single();
        self.client.execute(req).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let req = PostgrestRequest::delete("categories").eq("id", id);
        tracing::info!(%id, "deleting category");
        self.client.execute_empty(req).await
    }
}
