//! Pure REST client for the Open Shelf hosted backend.
//!
//! Wraps the service's PostgREST-style table interface, its auth
//! endpoints and its named RPC procedures behind typed, `Result`-returning
//! calls. The client owns no data: the hosted service is the system of
//! record, and every operation here is one request/response cycle.
//!
//! # Example
//!
//! ```rust,ignore
//! use openshelf_client::{ClientConfig, ResourceFilters, ShelfClient};
//!
//! let client = ShelfClient::from_env()?;
//!
//! let filters = ResourceFilters {
//!     search: Some("rust".into()),
//!     ..Default::default()
//! };
//! for resource in client.resources().get_all(&filters).await? {
//!     println!("{} by {}", resource.title, resource.author);
//! }
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod query;
pub mod types;

pub use auth::{AuthClient, AuthSubscription};
pub use config::ClientConfig;
pub use error::{Result, ShelfError};
pub use types::{
    AuthData, AuthEvent, Category, CategoryChange, DifficultyLevel, Favorite, NewCategory,
    NewResource, ProgressEntry, Resource, ResourceChange, ResourceFilters, ResourceType, Session,
    User,
};

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::query::PostgrestRequest;

/// One configured connection to the hosted service.
///
/// Constructed once at startup and passed to whatever needs it; cloning
/// is cheap and every clone shares the same HTTP pool and auth state.
#[derive(Clone)]
pub struct ShelfClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    rest_url: String,
    anon_key: String,
    auth: AuthClient,
}

impl fmt::Debug for ShelfClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShelfClient")
            .field("rest_url", &self.inner.rest_url)
            .finish_non_exhaustive()
    }
}

impl ShelfClient {
    pub fn new(config: ClientConfig) -> Self {
        let http = reqwest::Client::new();
        let auth = AuthClient::new(http.clone(), &config);
        Self {
            inner: Arc::new(ClientInner {
                http,
                rest_url: config.rest_url(),
                anon_key: config.service_key,
                auth,
            }),
        }
    }

    /// Construct from `SHELF_SERVICE_URL` / `SHELF_SERVICE_KEY`. Fails
    /// fast with a `Config` error when either is missing.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ClientConfig::from_env()?))
    }

    /// The auth bridge for this connection.
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    pub fn categories(&self) -> db::Categories<'_> {
        db::Categories { client: self }
    }

    pub fn resources(&self) -> db::Resources<'_> {
        db::Resources { client: self }
    }

    pub fn favorites(&self) -> db::Favorites<'_> {
        db::Favorites { client: self }
    }

    pub fn progress(&self) -> db::Progress<'_> {
        db::Progress { client: self }
    }

    /// Execute a request and deserialize the response body.
    pub(crate) async fn execute<T: DeserializeOwned>(&self, req: PostgrestRequest) -> Result<T> {
        let response = self.send(req).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShelfError::from_response(status.as_u16(), &body));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ShelfError::Parse(e.to_string()))
    }

    /// Execute a request whose response body is irrelevant (deletes,
    /// void procedures).
    pub(crate) async fn execute_empty(&self, req: PostgrestRequest) -> Result<()> {
        let response = self.send(req).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShelfError::from_response(status.as_u16(), &body));
        }
        Ok(())
    }

    async fn send(&self, req: PostgrestRequest) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.inner.rest_url, req.path);
        let mut builder = self
            .inner
            .http
            .request(req.method.clone(), &url)
            .query(req.params())
            .header("apikey", &self.inner.anon_key);

        // Authenticated requests ride the session token; anonymous ones
        // fall back to the anon key, which the service maps to the
        // public role.
        let token = self
            .inner
            .auth
            .access_token()
            .unwrap_or_else(|| self.inner.anon_key.clone());
        builder = builder.bearer_auth(token);

        if req.single {
            builder = builder.header(
                reqwest::header::ACCEPT,
                "application/vnd.pgrst.object+json",
            );
        }
        if let Some(prefer) = req.prefer_header() {
            builder = builder.header("Prefer", prefer);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }
}
