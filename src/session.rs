//! Session synchronizer
//!
//! Turns whatever credentials are stored into a resolved session:
//! `Uninitialized -> Loading -> Authenticated | Unauthenticated`.
//! Consumers read [`SessionSnapshot`]s, either on demand or through a
//! `watch` subscription.
//!
//! An authenticated session follows the credential store: a refreshed
//! access token replaces the one in the snapshot, and credentials cleared
//! by the HTTP client (failed or impossible refresh) sign the session out.

use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use panorama_protocol::api::ProfileResponse;

use crate::client::{ApiClient, Transport};
use crate::error::{PanoramaError, Result};
use crate::store::CredentialStore;
use crate::user::User;

pub const PROFILE_ENDPOINT: &str = "/usuarios/yo";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Point-in-time view of the session
///
/// Fields are private so the state, user and token always move together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    state: SessionState,
    user: Option<User>,
    access_token: Option<String>,
}

impl SessionSnapshot {
    pub fn new(state: SessionState, user: Option<User>, access_token: Option<String>) -> Self {
        Self {
            state,
            user,
            access_token,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Never true while the session check is still running
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
            && self.access_token.is_some()
            && self.user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Loading
    }
}

pub struct SessionManager<T> {
    client: Arc<ApiClient<T>>,
    state: Arc<watch::Sender<SessionSnapshot>>,
}

impl<T: Transport> SessionManager<T> {
    /// Inside a Tokio runtime this also starts a task that pushes store
    /// changes to subscribers; reads reconcile with the store either way.
    pub fn new(client: Arc<ApiClient<T>>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        let state = Arc::new(state);

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(follow_credentials(
                client.store().subscribe(),
                Arc::downgrade(client.store()),
                Arc::downgrade(&state),
            ));
        }

        Self { client, state }
    }

    pub fn client(&self) -> &Arc<ApiClient<T>> {
        &self.client
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.sync_with_store();
        self.state.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot().state
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot().is_loading()
    }

    pub fn user(&self) -> Option<User> {
        self.snapshot().user
    }

    pub fn access_token(&self) -> Option<String> {
        self.snapshot().access_token
    }

    /// Apply credential changes the HTTP client made behind the session's back
    pub fn sync_with_store(&self) -> bool {
        reconcile(&self.state, self.client.store())
    }

    /// Resolve the session from stored credentials
    ///
    /// Failures are never returned: any problem fetching the profile clears
    /// the stored credentials and leaves the session unauthenticated.
    pub async fn initialize(&self) -> SessionState {
        let Some(token) = self.client.store().access_token() else {
            debug!("No stored access token");
            self.publish(SessionState::Unauthenticated, None, None);
            return SessionState::Unauthenticated;
        };

        self.publish(SessionState::Loading, None, Some(token));

        match self.fetch_profile().await {
            Ok(user) => {
                info!(user_id = user.id, "Session restored");
                let token = self.client.store().access_token();
                self.publish(SessionState::Authenticated, Some(user), token);
                SessionState::Authenticated
            }
            Err(e) => {
                warn!("Session check failed, signing out: {}", e);
                if let Err(clear_err) = self.client.store().clear_auth_tokens() {
                    warn!("Failed to clear credentials: {}", clear_err);
                }
                self.publish(SessionState::Unauthenticated, None, None);
                SessionState::Unauthenticated
            }
        }
    }

    /// `GET /usuarios/yo`, validated
    pub async fn fetch_profile(&self) -> Result<User> {
        let response: ProfileResponse = self.client.get(PROFILE_ENDPOINT).await?;
        let usuario = response
            .into_usuario()
            .ok_or_else(|| PanoramaError::invalid_response("Profile response contained no user"))?;
        User::from_payload(usuario)
    }

    /// Mark the session authenticated with `user` and the stored token
    pub fn establish(&self, user: User) {
        let token = self.client.store().access_token();
        self.publish(SessionState::Authenticated, Some(user), token);
    }

    /// Drop the user and token together
    pub fn clear(&self) {
        self.publish(SessionState::Unauthenticated, None, None);
    }

    fn publish(&self, state: SessionState, user: Option<User>, access_token: Option<String>) {
        self.state
            .send_replace(SessionSnapshot::new(state, user, access_token));
    }
}

/// Bring an authenticated snapshot in line with the stored access token
fn reconcile(state: &watch::Sender<SessionSnapshot>, store: &CredentialStore) -> bool {
    state.send_if_modified(|snapshot| {
        if snapshot.state != SessionState::Authenticated {
            return false;
        }
        match store.access_token() {
            None => {
                info!("Stored credentials are gone, signing the session out");
                *snapshot = SessionSnapshot::new(SessionState::Unauthenticated, None, None);
                true
            }
            Some(token) if snapshot.access_token.as_deref() != Some(token.as_str()) => {
                debug!("Session picked up a rotated access token");
                snapshot.access_token = Some(token);
                true
            }
            Some(_) => false,
        }
    })
}

async fn follow_credentials(
    mut changes: watch::Receiver<Option<String>>,
    store: Weak<CredentialStore>,
    state: Weak<watch::Sender<SessionSnapshot>>,
) {
    while changes.changed().await.is_ok() {
        let (Some(store), Some(state)) = (store.upgrade(), state.upgrade()) else {
            break;
        };
        reconcile(&state, &store);
    }
}

impl<T> std::fmt::Debug for SessionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.borrow())
            .finish()
    }
}
