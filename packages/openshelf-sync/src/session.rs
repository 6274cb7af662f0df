//! Session state mirrored from the auth bridge.

use std::sync::Arc;

use tokio::sync::watch;

use openshelf_client::{AuthClient, AuthSubscription, User};

use crate::state::{Snapshot, StateCell};

/// Mirrors the signed-in user into view state.
///
/// Attaching subscribes to the bridge's session transitions and seeds
/// from the current session, so the store tracks sign-in, sign-out and
/// token refresh without polling. Dropping the store releases the
/// subscription.
pub struct SessionStore {
    state: Arc<StateCell<Option<User>>>,
    _subscription: AuthSubscription,
}

impl SessionStore {
    pub async fn attach(auth: &AuthClient) -> Self {
        let state = Arc::new(StateCell::new(None));

        // Subscribe before seeding so a transition during the seed fetch
        // is not lost; the generation guard keeps whichever is newer.
        let cell = state.clone();
        let subscription = auth.on_auth_state_change(move |_event, session| {
            let generation = cell.begin();
            cell.complete(generation, Ok(session.map(|s| s.user)));
        });

        let generation = state.begin();
        let outcome = auth.get_user().await.map_err(|e| e.to_string());
        state.complete(generation, outcome);

        Self {
            state,
            _subscription: subscription,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.snapshot().data.is_some()
    }

    pub fn snapshot(&self) -> Snapshot<Option<User>> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Option<User>>> {
        self.state.subscribe()
    }
}
