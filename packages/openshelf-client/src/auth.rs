//! Session-based authentication against the hosted auth interface.
//!
//! Wraps sign up, sign in, sign out and current-user fetch behind
//! `Result`-returning calls, caches the live session, and fans session
//! transitions out to registered listeners. The rest of the client reads
//! the cached access token from here when authorizing table requests.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use serde_json::json;

use crate::config::ClientConfig;
use crate::error::{Result, ShelfError};
use crate::types::{AuthData, AuthEvent, Session, User};

type Listener = Arc<dyn Fn(AuthEvent, Option<Session>) + Send + Sync>;

/// Client for the auth interface. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    http: reqwest::Client,
    auth_url: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
    listeners: Mutex<HashMap<u64, Listener>>,
    next_listener_id: AtomicU64,
}

impl fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthClient")
            .field("auth_url", &self.inner.auth_url)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    pub(crate) fn new(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            inner: Arc::new(AuthInner {
                http,
                auth_url: config.auth_url(),
                anon_key: config.service_key.clone(),
                session: RwLock::new(None),
                listeners: Mutex::new(HashMap::new()),
                next_listener_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a new account. Depending on service settings the response
    /// carries a live session (auto-confirm) or just the pending user.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthData> {
        let url = format!("{}/signup", self.inner.auth_url);
        let body = self
            .request(self.inner.http.post(&url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let value = self.read_body(body).await?;

        if value.get("access_token").is_some() {
            let session: Session = serde_json::from_value(value)
                .map_err(|e| ShelfError::Parse(e.to_string()))?;
            let user = session.user.clone();
            self.store_session(Some(session.clone()), Some(AuthEvent::SignedIn));
            tracing::info!(email, "signed up with auto-confirmed session");
            return Ok(AuthData {
                user: Some(user),
                session: Some(session),
            });
        }

        // Confirmation pending: the body is the user record, sometimes
        // nested under "user".
        let user_value = value.get("user").cloned().unwrap_or(value);
        let user: User =
            serde_json::from_value(user_value).map_err(|e| ShelfError::Parse(e.to_string()))?;
        tracing::info!(email, "signed up, confirmation pending");
        Ok(AuthData {
            user: Some(user),
            session: None,
        })
    }

    /// Exchange email/password for a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthData> {
        let url = format!("{}/token?grant_type=password", self.inner.auth_url);
        let body = self
            .request(self.inner.http.post(&url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let value = self.read_body(body).await?;

        let session: Session =
            serde_json::from_value(value).map_err(|e| ShelfError::Parse(e.to_string()))?;
        let user = session.user.clone();
        self.store_session(Some(session.clone()), Some(AuthEvent::SignedIn));
        tracing::info!(email, "signed in");
        Ok(AuthData {
            user: Some(user),
            session: Some(session),
        })
    }

    /// Drop the local session and revoke it server-side.
    ///
    /// The local session is cleared (and `SignedOut` emitted) before the
    /// revocation request, so callers are signed out locally even when the
    /// service is unreachable.
    pub async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.take_session() else {
            return Ok(());
        };
        self.emit(AuthEvent::SignedOut);
        tracing::info!("signed out");

        let url = format!("{}/logout", self.inner.auth_url);
        let response = self
            .inner
            .http
            .post(&url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(status.as_u16(), &body));
        }
        Ok(())
    }

    /// Fetch the user behind the current session, or `None` when signed out.
    pub async fn get_user(&self) -> Result<Option<User>> {
        let Some(token) = self.access_token() else {
            return Ok(None);
        };

        let url = format!("{}/user", self.inner.auth_url);
        let response = self
            .inner
            .http
            .get(&url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(status.as_u16(), &body));
        }
        let user = response
            .json::<User>()
            .await
            .map_err(|e| ShelfError::Parse(e.to_string()))?;
        Ok(Some(user))
    }

    /// Exchange the stored refresh token for a fresh session.
    pub async fn refresh_session(&self) -> Result<Session> {
        let refresh_token = {
            let session = self.read_session();
            match session {
                Some(s) => s.refresh_token,
                None => {
                    return Err(ShelfError::Validation("no active session to refresh".into()))
                }
            }
        };

        let url = format!("{}/token?grant_type=refresh_token", self.inner.auth_url);
        let body = self
            .request(self.inner.http.post(&url))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let value = self.read_body(body).await?;

        let session: Session =
            serde_json::from_value(value).map_err(|e| ShelfError::Parse(e.to_string()))?;
        self.store_session(Some(session.clone()), Some(AuthEvent::TokenRefreshed));
        tracing::debug!("session refreshed");
        Ok(session)
    }

    /// Register a listener for session transitions. The returned handle
    /// unsubscribes when dropped (or via [`AuthSubscription::unsubscribe`]).
    pub fn on_auth_state_change<F>(&self, callback: F) -> AuthSubscription
    where
        F: Fn(AuthEvent, Option<Session>) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .expect("auth listener registry poisoned")
            .insert(id, Arc::new(callback));
        AuthSubscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Snapshot of the current session, if any.
    pub fn current_session(&self) -> Option<Session> {
        self.read_session()
    }

    /// Access token of the current session, used to authorize table requests.
    pub(crate) fn access_token(&self) -> Option<String> {
        self.read_session().map(|s| s.access_token)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("apikey", &self.inner.anon_key)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<serde_json::Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(status.as_u16(), &body));
        }
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ShelfError::Parse(e.to_string()))
    }

    fn read_session(&self) -> Option<Session> {
        self.inner
            .session
            .read()
            .expect("auth session lock poisoned")
            .clone()
    }

    fn take_session(&self) -> Option<Session> {
        self.inner
            .session
            .write()
            .expect("auth session lock poisoned")
            .take()
    }

    fn store_session(&self, session: Option<Session>, event: Option<AuthEvent>) {
        *self
            .inner
            .session
            .write()
            .expect("auth session lock poisoned") = session;
        if let Some(event) = event {
            self.emit(event);
        }
    }

    fn emit(&self, event: AuthEvent) {
        let session = self.read_session();
        // Clone the listeners out so callbacks run without the registry
        // lock held; a callback may itself subscribe or unsubscribe.
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .expect("auth listener registry poisoned")
            .values()
            .cloned()
            .collect();
        tracing::debug!(event = %event, listeners = listeners.len(), "auth state change");
        for listener in listeners {
            listener(event, session.clone());
        }
    }
}

/// Unsubscribe handle returned by [`AuthClient::on_auth_state_change`].
///
/// Dropping the handle removes the listener, giving each subscriber a
/// deterministic release point tied to its own teardown.
pub struct AuthSubscription {
    id: u64,
    inner: Weak<AuthInner>,
}

impl AuthSubscription {
    /// Remove the listener now instead of at drop time.
    pub fn unsubscribe(self) {}
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .listeners
                .lock()
                .expect("auth listener registry poisoned")
                .remove(&self.id);
        }
    }
}

/// Map an auth-interface error body onto the taxonomy. The auth layer
/// reports messages under `msg`, `error_description` or `message`
/// depending on the endpoint.
fn auth_error(status: u16, body: &str) -> ShelfError {
    let value: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = value
        .as_ref()
        .and_then(|v| {
            v.get("msg")
                .or_else(|| v.get("error_description"))
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
        })
        .unwrap_or(body.trim())
        .to_string();

    match status {
        409 => ShelfError::Conflict(message),
        400 | 422 => ShelfError::Validation(message),
        _ => ShelfError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn test_client() -> AuthClient {
        let config = ClientConfig::new("https://example.test", "anon-key");
        AuthClient::new(reqwest::Client::new(), &config)
    }

    fn dummy_session() -> Session {
        Session {
            access_token: "tok".into(),
            refresh_token: "ref".into(),
            token_type: Some("bearer".into()),
            expires_in: Some(3600),
            user: User {
                id: uuid::Uuid::new_v4(),
                email: Some("dev@example.test".into()),
                created_at: None,
                last_sign_in_at: None,
            },
        }
    }

    #[test]
    fn listeners_receive_each_transition() {
        let auth = test_client();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_a = seen.clone();
        let _sub_a = auth.on_auth_state_change(move |event, _| {
            seen_a.lock().unwrap().push(("a", event));
        });
        let seen_b = seen.clone();
        let _sub_b = auth.on_auth_state_change(move |event, _| {
            seen_b.lock().unwrap().push(("b", event));
        });

        auth.store_session(Some(dummy_session()), Some(AuthEvent::SignedIn));
        auth.store_session(None, Some(AuthEvent::SignedOut));

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 4);
        assert!(events.contains(&("a", AuthEvent::SignedIn)));
        assert!(events.contains(&("b", AuthEvent::SignedOut)));
    }

    #[test]
    fn listener_sees_session_matching_the_event() {
        let auth = test_client();
        let observed = Arc::new(Mutex::new(None));

        let observed_cb = observed.clone();
        let _sub = auth.on_auth_state_change(move |event, session| {
            if event == AuthEvent::SignedIn {
                *observed_cb.lock().unwrap() = session;
            }
        });

        auth.store_session(Some(dummy_session()), Some(AuthEvent::SignedIn));
        assert_eq!(
            observed.lock().unwrap().as_ref().map(|s| s.access_token.clone()),
            Some("tok".to_string())
        );
    }

    #[test]
    fn dropping_the_handle_stops_delivery() {
        let auth = test_client();
        let count = Arc::new(AtomicUsize::new(0));

        let count_cb = count.clone();
        let sub = auth.on_auth_state_change(move |_, _| {
            count_cb.fetch_add(1, Ordering::SeqCst);
        });

        auth.store_session(Some(dummy_session()), Some(AuthEvent::SignedIn));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        drop(sub);
        auth.store_session(None, Some(AuthEvent::SignedOut));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_unsubscribe_stops_delivery() {
        let auth = test_client();
        let count = Arc::new(AtomicUsize::new(0));

        let count_cb = count.clone();
        let sub = auth.on_auth_state_change(move |_, _| {
            count_cb.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();

        auth.store_session(Some(dummy_session()), Some(AuthEvent::SignedIn));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_without_session_is_a_validation_error() {
        let auth = test_client();
        assert!(matches!(
            auth.refresh_session().await,
            Err(ShelfError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn sign_out_without_session_is_a_noop() {
        let auth = test_client();
        assert!(auth.sign_out().await.is_ok());
        assert!(auth.current_session().is_none());
    }

    #[test]
    fn auth_error_prefers_service_message_fields() {
        let err = auth_error(400, r#"{"error_description":"Invalid login credentials"}"#);
        match err {
            ShelfError::Validation(msg) => assert_eq!(msg, "Invalid login credentials"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
