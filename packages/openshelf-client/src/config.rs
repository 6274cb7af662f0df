//! Startup configuration for the service connection.

use std::env;

use crate::error::{Result, ShelfError};

/// Connection settings for the hosted backend.
///
/// Both values are required; construction fails fast when either is
/// missing so a misconfigured process never gets as far as issuing
/// requests with an empty key.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the hosted service
    pub service_url: String,
    /// Anonymous (publishable) API key
    pub service_key: String,
}

impl ClientConfig {
    pub fn new(service_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            service_key: service_key.into(),
        }
    }

    /// Load configuration from `SHELF_SERVICE_URL` / `SHELF_SERVICE_KEY`.
    ///
    /// Reads a `.env` file first if one is present (development).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let service_url = env::var("SHELF_SERVICE_URL")
            .map_err(|_| ShelfError::Config("SHELF_SERVICE_URL must be set".into()))?;
        let service_key = env::var("SHELF_SERVICE_KEY")
            .map_err(|_| ShelfError::Config("SHELF_SERVICE_KEY must be set".into()))?;

        if service_url.trim().is_empty() {
            return Err(ShelfError::Config("SHELF_SERVICE_URL is empty".into()));
        }
        if service_key.trim().is_empty() {
            return Err(ShelfError::Config("SHELF_SERVICE_KEY is empty".into()));
        }

        Ok(Self {
            service_url,
            service_key,
        })
    }

    /// Base of the table-oriented REST interface.
    pub(crate) fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.service_url.trim_end_matches('/'))
    }

    /// Base of the auth interface.
    pub(crate) fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.service_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_and_auth_urls_strip_trailing_slash() {
        let cfg = ClientConfig::new("https://example.test/", "anon");
        assert_eq!(cfg.rest_url(), "https://example.test/rest/v1");
        assert_eq!(cfg.auth_url(), "https://example.test/auth/v1");
    }
}
