//! Types for the catalog schema as seen by the client.
//!
//! The schema itself is owned by the hosted service; these mirror the rows
//! and enumerations it returns, plus the filter object accepted by the
//! resource listing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Categories
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for creating a category. The service assigns id and timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Partial update for a category; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Book,
    Video,
    Article,
    Course,
    Guide,
    Reference,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Book => "book",
            ResourceType::Video => "video",
            ResourceType::Article => "article",
            ResourceType::Course => "course",
            ResourceType::Guide => "guide",
            ResourceType::Reference => "reference",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "book" => Ok(ResourceType::Book),
            "video" => Ok(ResourceType::Video),
            "article" => Ok(ResourceType::Article),
            "course" => Ok(ResourceType::Course),
            "guide" => Ok(ResourceType::Guide),
            "reference" => Ok(ResourceType::Reference),
            other => Err(format!("unknown resource type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(DifficultyLevel::Beginner),
            "intermediate" => Ok(DifficultyLevel::Intermediate),
            "advanced" => Ok(DifficultyLevel::Advanced),
            other => Err(format!("unknown difficulty level: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub author: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub difficulty_level: DifficultyLevel,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub views_count: i64,
    #[serde(default)]
    pub downloads_count: i64,
    #[serde(default)]
    pub is_featured: bool,
    pub is_published: bool,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Expanded owning category, present on reads that request the join.
    #[serde(default)]
    pub category: Option<Category>,
}

/// Payload for creating a resource.
#[derive(Debug, Clone, Serialize)]
pub struct NewResource {
    pub title: String,
    pub description: String,
    pub author: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub difficulty_level: DifficultyLevel,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    pub is_featured: bool,
    pub is_published: bool,
}

/// Partial update for a resource; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ResourceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<DifficultyLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

/// Filter object for the resource listing.
///
/// Keys combine with logical AND; `search` expands to a case-insensitive
/// OR over title, description and author. An unset key places no
/// constraint on its field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceFilters {
    pub category_id: Option<Uuid>,
    pub resource_type: Option<ResourceType>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

impl ResourceFilters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Favorites
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resource_id: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Expanded resource (with its category), present on reads that
    /// request the join.
    #[serde(default)]
    pub resource: Option<Resource>,
}

// ============================================================================
// Progress
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub user_id: Uuid,
    pub resource_id: Uuid,
    pub progress_percentage: u8,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Slim resource expansion for progress listings.
    #[serde(default)]
    pub resource: Option<ProgressResource>,
}

/// The subset of resource fields the progress listing expands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressResource {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
}

// ============================================================================
// Auth
// ============================================================================

/// A user record as returned by the auth interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

/// A live session: tokens plus the user they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: User,
}

/// Outcome of a sign-up or sign-in call.
///
/// Sign-in always carries a session; sign-up carries one only when the
/// service confirms accounts automatically, otherwise just the pending
/// user record.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthData {
    pub user: Option<User>,
    pub session: Option<Session>,
}

/// Session transition delivered to auth-state subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

impl AuthEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthEvent::SignedIn => "SIGNED_IN",
            AuthEvent::SignedOut => "SIGNED_OUT",
            AuthEvent::TokenRefreshed => "TOKEN_REFRESHED",
        }
    }
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
