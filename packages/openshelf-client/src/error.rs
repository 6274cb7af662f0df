//! Error types for the Open Shelf client.

use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Open Shelf client errors.
///
/// Every adapter and auth operation resolves to `Result<T, ShelfError>`;
/// nothing in this crate panics on a failed call.
#[derive(Debug, Error)]
pub enum ShelfError {
    /// A single-row query matched zero rows
    #[error("not found")]
    NotFound,

    /// Unique-constraint violation (e.g. duplicate favorite)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed filter or update payload, rejected before or by the service
    #[error("validation error: {0}")]
    Validation(String),

    /// Transport failure (connection refused, timeout, TLS)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response that maps to no more specific variant
    #[error("service error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Missing or invalid startup configuration — fatal, halts initialization
    #[error("configuration error: {0}")]
    Config(String),
}

/// Error body returned by the PostgREST layer.
///
/// `code` carries either a PostgREST code (`PGRST116` for zero rows in
/// single-row mode) or a Postgres SQLSTATE (`23505` for unique violations).
#[derive(Debug, serde::Deserialize)]
pub struct ServiceErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
}

/// Code for "JSON object requested, multiple (or no) rows returned".
const PGRST_NO_ROWS: &str = "PGRST116";
/// SQLSTATE for unique-constraint violations.
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

impl ShelfError {
    /// Map a non-2xx service response onto the error taxonomy.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<ServiceErrorBody> = serde_json::from_str(body).ok();
        let code = parsed.as_ref().and_then(|b| b.code.as_deref());
        let message = parsed
            .as_ref()
            .and_then(|b| b.message.clone())
            .unwrap_or_else(|| body.trim().to_string());

        match (status, code) {
            (_, Some(PGRST_NO_ROWS)) | (406, _) => ShelfError::NotFound,
            (_, Some(SQLSTATE_UNIQUE_VIOLATION)) | (409, _) => ShelfError::Conflict(message),
            (400 | 422, _) => ShelfError::Validation(message),
            (404, _) => ShelfError::NotFound,
            _ => ShelfError::Api { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_pgrst_no_rows_to_not_found() {
        let body = r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert!(matches!(
            ShelfError::from_response(406, body),
            ShelfError::NotFound
        ));
        // Same code under a different status still means zero rows
        assert!(matches!(
            ShelfError::from_response(200, body),
            ShelfError::NotFound
        ));
    }

    #[test]
    fn maps_unique_violation_to_conflict() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint \"user_favorites_user_id_resource_id_key\""}"#;
        match ShelfError::from_response(409, body) {
            ShelfError::Conflict(msg) => assert!(msg.contains("duplicate key")),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn maps_bad_request_to_validation() {
        let body = r#"{"code":"22P02","message":"invalid input syntax for type uuid"}"#;
        assert!(matches!(
            ShelfError::from_response(400, body),
            ShelfError::Validation(_)
        ));
    }

    #[test]
    fn unparseable_body_falls_back_to_api_error() {
        let err = ShelfError::from_response(500, "upstream exploded");
        match err {
            ShelfError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }
}
