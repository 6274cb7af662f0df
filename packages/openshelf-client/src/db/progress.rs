//! Per-user progress tracking with upsert semantics.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{Result, ShelfError};
use crate::query::PostgrestRequest;
use crate::types::ProgressEntry;
use crate::ShelfClient;

/// Adapter facade for the `user_progress` table.
pub struct Progress<'a> {
    pub(crate) client: &'a ShelfClient,
}

/// Build the upsert payload for one progress write.
///
/// The completion timestamp is set iff the percentage is exactly 100 and
/// cleared otherwise; a later write below 100 therefore un-completes the
/// resource (last write wins, no merge). Percentages above 100 are
/// rejected before any request is issued.
fn upsert_payload(
    user_id: Uuid,
    resource_id: Uuid,
    percentage: u8,
    now: DateTime<Utc>,
) -> Result<Value> {
    if percentage > 100 {
        return Err(ShelfError::Validation(format!(
            "progress percentage must be 0-100, got {percentage}"
        )));
    }
    let completed_at = (percentage == 100).then(|| now.to_rfc3339());
    Ok(json!({
        "user_id": user_id,
        "resource_id": resource_id,
        "progress_percentage": percentage,
        "completed_at": completed_at,
    }))
}

impl Progress<'_> {
    /// Upsert the progress row for (user, resource).
    pub async fn update(
        &self,
        user_id: Uuid,
        resource_id: Uuid,
        percentage: u8,
    ) -> Result<ProgressEntry> {
        let body = upsert_payload(user_id, resource_id, percentage, Utc::now())?;
        let req = PostgrestRequest::upsert("user_progress", body)
            .on_conflict("user_id,resource_id")
            .select("*")
            .returning()
            .single();
        tracing::debug!(%user_id, %resource_id, percentage, "recording progress");
        self.client.execute(req).await
    }

    /// All of a user's progress rows, most recently updated first, with a
    /// slim resource expansion for display.
    pub async fn for_user(&self, user_id: Uuid) -> Result<Vec<ProgressEntry>> {
        let req = PostgrestRequest::get("user_progress")
            .select("*,resource:resources(id,title,type)")
            .eq("user_id", user_id)
            .order_desc("updated_at");
        self.client.execute(req).await
    }

    /// Progress for one (user, resource) pair, or `None` when the user
    /// has not started the resource.
    pub async fn for_resource(
        &self,
        user_id: Uuid,
        resource_id: Uuid,
    ) -> Result<Option<ProgressEntry>> {
        let req = PostgrestRequest::get("user_progress")
            .select("*")
            .eq("user_id", user_id)
            .eq("resource_id", resource_id)
            .single();
        match self.client.execute::<ProgressEntry>(req).await {
            Ok(entry) => Ok(Some(entry)),
            Err(ShelfError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
