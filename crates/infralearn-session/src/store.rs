//! The client session state machine.
//!
//! ```text
//!            init()
//!   Idle ─────────────▶ Loading ──┬──▶ Authenticated
//!    ▲                            └──▶ Idle
//!    │  sign_out() / failure / Expired
//!    └──────────────────────────── Authenticated
//! ```
//!
//! State is published through a [`watch`] channel and only changes through
//! the store's methods. Methods are serialized by an async lock, and the
//! backend event listener takes the same lock, so a late event can never
//! overwrite the result of a newer call.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use validator::Validate;

use infralearn_config::AccountPolicy;
use infralearn_models::Identity;
use infralearn_models::auth::SignUpRequest;
use infralearn_models::users::UpdateProfileDto;
use infralearn_models::validation::describe;

use crate::backend::{AuthBackend, SessionEvent};
use crate::error::SessionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Unauthenticated while the persisted session is being resolved.
    Loading,
    /// Unauthenticated and settled.
    Idle,
    Authenticated(Identity),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

struct Inner {
    backend: Arc<dyn AuthBackend>,
    policy: AccountPolicy,
    state: watch::Sender<SessionState>,
    op_lock: AsyncMutex<()>,
}

impl Inner {
    fn set(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Re-derives the state from whatever session the backend holds now.
    async fn resolve(&self) -> SessionState {
        let session = match self.backend.current_session().await {
            Ok(Some(session)) => session,
            Ok(None) => return SessionState::Idle,
            Err(err) => {
                warn!(error = %err, "Could not restore session");
                return SessionState::Idle;
            }
        };

        match self.backend.load_identity(&session).await {
            Ok(Some(identity)) => SessionState::Authenticated(identity),
            Ok(None) => {
                warn!(user_id = %session.user_id, "Session has no identity record");
                SessionState::Idle
            }
            Err(err) => {
                warn!(error = %err, "Could not load identity");
                SessionState::Idle
            }
        }
    }

    async fn resync(&self) {
        let _guard = self.op_lock.lock().await;
        let state = self.resolve().await;
        self.set(state);
    }
}

/// Holds the signed-in identity for one application instance.
///
/// Create it with a backend, call [`init`](Self::init) once, and
/// [`teardown`](Self::teardown) when the application shuts down.
pub struct SessionStore {
    inner: Arc<Inner>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn AuthBackend>, policy: AccountPolicy) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            inner: Arc::new(Inner {
                backend,
                policy,
                state,
                op_lock: AsyncMutex::new(()),
            }),
            listener: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Receives every state change.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Restores any persisted session and starts following backend events.
    /// Calling it again restarts the listener.
    pub async fn init(&self) {
        self.stop_listener();
        let events = self.inner.backend.subscribe();

        {
            let _guard = self.inner.op_lock.lock().await;
            self.inner.set(SessionState::Loading);
            let state = self.inner.resolve().await;
            self.inner.set(state);
        }

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(listen(inner, events));
        *self.listener.lock() = Some(handle);
    }

    /// Stops the listener and forgets the current identity. The backend
    /// session is left alone so the next `init` can restore it.
    ///
    /// Waits for any in-flight call, so nothing it publishes survives.
    pub async fn teardown(&self) {
        self.stop_listener();
        let _guard = self.inner.op_lock.lock().await;
        self.inner.set(SessionState::Idle);
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Identity, SessionError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(SessionError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let _guard = self.inner.op_lock.lock().await;
        let result = self.authenticate(username.trim(), password).await;

        match &result {
            Ok(identity) => self.inner.set(SessionState::Authenticated(identity.clone())),
            Err(_) => self.inner.set(SessionState::Idle),
        }
        result
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Identity, SessionError> {
        let session = self.inner.backend.sign_in(username, password).await?;

        let err = match self.inner.backend.load_identity(&session).await {
            Ok(Some(identity)) => return Ok(identity),
            Ok(None) => SessionError::ProfileMissing,
            Err(err) => err.into(),
        };

        // A backend session without a usable identity must not outlive the
        // failed call, or the listener would restore it.
        if let Err(release) = self.inner.backend.sign_out().await {
            warn!(error = %release, "Failed to release session after failed sign-in");
        }
        Err(err)
    }

    /// Registers a new account. Role rules (institutional email for
    /// students, no self-registered administrators) are checked before the
    /// backend is contacted. The new account is not signed in.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Identity, SessionError> {
        request
            .check(&self.inner.policy)
            .map_err(|rejection| SessionError::Validation(rejection.to_string()))?;

        let _guard = self.inner.op_lock.lock().await;

        if self.inner.backend.username_taken(&request.username).await? {
            return Err(SessionError::Validation("Username already taken".to_string()));
        }

        Ok(self.inner.backend.register(&request).await?)
    }

    /// Always ends unauthenticated. Backend failures are logged, not
    /// returned, so calling this twice is harmless.
    pub async fn sign_out(&self) {
        let _guard = self.inner.op_lock.lock().await;

        if let Err(err) = self.inner.backend.sign_out().await {
            warn!(error = %err, "Backend sign-out failed; clearing local session anyway");
        }
        self.inner.set(SessionState::Idle);
    }

    pub async fn update_profile(&self, changes: UpdateProfileDto) -> Result<Identity, SessionError> {
        changes
            .validate()
            .map_err(|errors| SessionError::Validation(describe(&errors)))?;

        let _guard = self.inner.op_lock.lock().await;

        let current = self
            .inner
            .state
            .borrow()
            .identity()
            .cloned()
            .ok_or(SessionError::NotAuthenticated)?;

        let updated = self.inner.backend.update_identity(current.id, &changes).await?;
        self.inner.set(SessionState::Authenticated(updated.clone()));
        Ok(updated)
    }

    fn stop_listener(&self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.stop_listener();
    }
}

async fn listen(inner: Arc<Inner>, mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                debug!(?event, "Session event");
                inner.resync().await;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "Session listener lagged, resynchronizing");
                inner.resync().await;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
