//! Resource listing, lookup and counter bumps.

use serde_json::json;
use uuid::Uuid;

use super::CATEGORY_EXPANSION;
use crate::error::{Result, ShelfError};
use crate::query::PostgrestRequest;
use crate::types::{NewResource, Resource, ResourceChange, ResourceFilters};
use crate::ShelfClient;

/// Adapter facade for the `resources` table and its counter procedures.
pub struct Resources<'a> {
    pub(crate) client: &'a ShelfClient,
}

/// Build the default listing request for a filter object.
///
/// The published predicate and newest-first order are applied before any
/// filter and cannot be disabled by one. Filter keys combine with AND;
/// `search` contributes a single OR group over title, description and
/// author. An unset key adds no predicate at all.
fn listing_request(filters: &ResourceFilters) -> PostgrestRequest {
    let mut req = PostgrestRequest::get("resources")
        .select(&format!("*,{CATEGORY_EXPANSION}"))
        .eq("is_published", true)
        .order_desc("created_at");

    if let Some(category_id) = filters.category_id {
        req = req.eq("category_id", category_id);
    }
    if let Some(resource_type) = filters.resource_type {
        req = req.eq("type", resource_type);
    }
    if let Some(level) = filters.difficulty_level {
        req = req.eq("difficulty_level", level);
    }
    if let Some(term) = filters.search.as_deref() {
        if !term.is_empty() {
            req = req.or_ilike(&["title", "description", "author"], term);
        }
    }
    if let Some(featured) = filters.featured {
        req = req.eq("is_featured", featured);
    }
    req
}

impl Resources<'_> {
    /// Published resources, newest first, with the owning category
    /// expanded. See [`ResourceFilters`] for the recognized keys.
    pub async fn get_all(&self, filters: &ResourceFilters) -> Result<Vec<Resource>> {
        let req = listing_request(filters);
        tracing::debug!(params = ?req.params(), "listing resources");
        self.client.execute(req).await
    }

    /// Single resource with category expanded; `NotFound` when no row
    /// matches.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Resource> {
        let req = PostgrestRequest::get("resources")
            .select(&format!("*,{CATEGORY_EXPANSION}"))
            .eq("id", id)
            .single();
        self.client.execute(req).await
    }

    pub async fn create(&self, new: NewResource) -> Result<Resource> {
        let body = serde_json::to_value(&new).map_err(|e| ShelfError::Parse(e.to_string()))?;
        let req = PostgrestRequest::insert("resources", body)
            .select("*")
            .returning()
            .single();
        tracing::info!(title = %new.title, "creating resource");
        self.client.execute(req).await
    }

    pub async fn update(&self, id: Uuid, change: ResourceChange) -> Result<Resource> {
        let body = serde_json::to_value(&change).map_err(|e| ShelfError::Parse(e.to_string()))?;
        let req = PostgrestRequest::update("resources", body)
            .eq("id", id)
            .select("*")
            .returning()
            .single();
        self.client.execute(req).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let req = PostgrestRequest::delete("resources").eq("id", id);
        tracing::info!(%id, "deleting resource");
        self.client.execute_empty(req).await
    }

    /// Bump the view counter through the server-side procedure. The
    /// increment happens in the database, so concurrent viewers never
    /// lose updates to a read-modify-write cycle.
    pub async fn increment_views(&self, id: Uuid) -> Result<()> {
        let req = PostgrestRequest::rpc("increment_views", json!({ "resource_id": id }));
        self.client.execute_empty(req).await
    }

    /// Bump the download counter through the server-side procedure.
    pub async fn increment_downloads(&self, id: Uuid) -> Result<()> {
        let req = PostgrestRequest::rpc("increment_downloads", json!({ "resource_id": id }));
        self.client.execute_empty(req).await
    }
}
