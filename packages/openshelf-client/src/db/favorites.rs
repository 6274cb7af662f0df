//! Favorite rows keyed by (user, resource).

use serde_json::json;
use uuid::Uuid;

use super::CATEGORY_EXPANSION;
use crate::error::{Result, ShelfError};
use crate::query::PostgrestRequest;
use crate::types::Favorite;
use crate::ShelfClient;

/// Adapter facade for the `user_favorites` table.
pub struct Favorites<'a> {
    pub(crate) client: &'a ShelfClient,
}

impl Favorites<'_> {
    /// A user's favorites, newest first, with the resource (and its
    /// category) expanded.
    pub async fn for_user(&self, user_id: Uuid) -> Result<Vec<Favorite>> {
        let req = PostgrestRequest::get("user_favorites")
            .select(&format!("*,resource:resources(*,{CATEGORY_EXPANSION})"))
            .eq("user_id", user_id)
            .order_desc("created_at");
        self.client.execute(req).await
    }

    /// Insert a favorite. The service enforces at most one row per
    /// (user, resource) pair; a duplicate surfaces as `Conflict`.
    pub async fn add(&self, user_id: Uuid, resource_id: Uuid) -> Result<Favorite> {
        let req = PostgrestRequest::insert(
            "user_favorites",
            json!({ "user_id": user_id, "resource_id": resource_id }),
        )
        .select("*")
        .returning()
        .single();
        tracing::debug!(%user_id, %resource_id, "adding favorite");
        self.client.execute(req).await
    }

    /// Delete by composite key. Removing an absent favorite succeeds,
    /// which makes the call idempotent.
    pub async fn remove(&self, user_id: Uuid, resource_id: Uuid) -> Result<()> {
        let req = PostgrestRequest::delete("user_favorites")
            .eq("user_id", user_id)
            .eq("resource_id", resource_id);
        tracing::debug!(%user_id, %resource_id, "removing favorite");
        self.client.execute_empty(req).await
    }

    /// Existence probe for one (user, resource) pair. Absence is an
    /// answer here, not an error.
    pub async fn check(&self, user_id: Uuid, resource_id: Uuid) -> Result<bool> {
        let req = PostgrestRequest::get("user_favorites")
            .select("id")
            .eq("user_id", user_id)
            .eq("resource_id", resource_id)
            .single();
        match self.client.execute::<serde_json::Value>(req).await {
            Ok(_) => Ok(true),
            Err(ShelfError::NotFound) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
