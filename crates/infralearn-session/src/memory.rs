use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

use infralearn_core::{hash_password, verify_password};
use infralearn_models::Identity;
use infralearn_models::auth::SignUpRequest;
use infralearn_models::users::{IdentityChanges, UpdateProfileDto};

use crate::backend::{AuthBackend, BackendError, BackendSession, SessionEvent};

const HASH_COST: u32 = 4;

struct Account {
    identity: Identity,
    password_hash: String,
    /// Cleared to simulate an account whose profile row went missing.
    has_profile: bool,
}

#[derive(Default)]
struct State {
    accounts: Vec<Account>,
    session: Option<Uuid>,
    fail_sign_out: bool,
    fail_next_identity_load: Option<String>,
    sign_in_delay: Option<Duration>,
}

/// An in-process identity provider for tests and offline demos.
///
/// Besides the [`AuthBackend`] operations it exposes hooks that simulate
/// what another client would do (`external_sign_in`, `expire_session`) and
/// counts how often the store reached it.
pub struct MemoryBackend {
    state: Mutex<State>,
    events: broadcast::Sender<SessionEvent>,
    calls: AtomicUsize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(State::default()),
            events,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn add_account(&self, identity: Identity, password: &str) {
        let password_hash = hash_password(password, HASH_COST).unwrap_or_default();
        self.state.lock().accounts.push(Account {
            identity,
            password_hash,
            has_profile: true,
        });
    }

    /// Number of [`AuthBackend`] calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn has_account(&self, username: &str) -> bool {
        self.state
            .lock()
            .accounts
            .iter()
            .any(|a| a.identity.username == username)
    }

    pub fn drop_profile(&self, username: &str) {
        if let Some(account) = self
            .state
            .lock()
            .accounts
            .iter_mut()
            .find(|a| a.identity.username == username)
        {
            account.has_profile = false;
        }
    }

    pub fn fail_sign_out(&self, fail: bool) {
        self.state.lock().fail_sign_out = fail;
    }

    /// Makes the next `load_identity` call fail as unavailable.
    pub fn fail_next_identity_load(&self, message: &str) {
        self.state.lock().fail_next_identity_load = Some(message.to_string());
    }

    /// Delays every `sign_in` by `delay` before it completes.
    pub fn set_sign_in_delay(&self, delay: Duration) {
        self.state.lock().sign_in_delay = Some(delay);
    }

    /// Whether the backend currently holds a signed-in session.
    pub fn has_session(&self) -> bool {
        self.state.lock().session.is_some()
    }

    /// Signs `username` in as if from another window.
    pub fn external_sign_in(&self, username: &str) -> bool {
        let mut state = self.state.lock();
        let Some(id) = state
            .accounts
            .iter()
            .find(|a| a.identity.username == username)
            .map(|a| a.identity.id)
        else {
            return false;
        };
        state.session = Some(id);
        drop(state);

        let _ = self.events.send(SessionEvent::SignedIn);
        true
    }

    pub fn expire_session(&self) {
        self.state.lock().session = None;
        let _ = self.events.send(SessionEvent::Expired);
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn session_for(id: Uuid) -> BackendSession {
        BackendSession {
            user_id: id,
            access_token: None,
        }
    }
}

#[async_trait]
impl AuthBackend for MemoryBackend {
    async fn current_session(&self) -> Result<Option<BackendSession>, BackendError> {
        self.record_call();
        Ok(self.state.lock().session.map(Self::session_for))
    }

    async fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> Result<BackendSession, BackendError> {
        self.record_call();
        let delay = self.state.lock().sign_in_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        let id = state
            .accounts
            .iter()
            .find(|a| a.identity.username == username)
            .filter(|a| verify_password(password, &a.password_hash))
            .map(|a| a.identity.id)
            .ok_or(BackendError::InvalidCredentials)?;

        state.session = Some(id);
        drop(state);

        let _ = self.events.send(SessionEvent::SignedIn);
        Ok(Self::session_for(id))
    }

    async fn load_identity(
        &self,
        session: &BackendSession,
    ) -> Result<Option<Identity>, BackendError> {
        self.record_call();
        let mut state = self.state.lock();
        if let Some(message) = state.fail_next_identity_load.take() {
            return Err(BackendError::Unavailable(message));
        }
        Ok(state
            .accounts
            .iter()
            .find(|a| a.identity.id == session.user_id && a.has_profile)
            .map(|a| a.identity.clone()))
    }

    async fn username_taken(&self, username: &str) -> Result<bool, BackendError> {
        self.record_call();
        Ok(self.has_account(username))
    }

    async fn register(&self, request: &SignUpRequest) -> Result<Identity, BackendError> {
        self.record_call();
        let password_hash = hash_password(&request.password, HASH_COST)
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let mut state = self.state.lock();
        if state.accounts.iter().any(|a| {
            a.identity.username == request.username
                || a.identity.email.eq_ignore_ascii_case(&request.email)
        }) {
            return Err(BackendError::Rejected(
                "Username or email already registered".to_string(),
            ));
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            username: request.username.clone(),
            name: request.name.clone(),
            email: request.email.clone(),
            role: request.role,
        };
        state.accounts.push(Account {
            identity: identity.clone(),
            password_hash,
            has_profile: true,
        });
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.record_call();
        let mut state = self.state.lock();
        if state.fail_sign_out {
            return Err(BackendError::Unavailable("sign-out rejected".to_string()));
        }
        let was_signed_in = state.session.take().is_some();
        drop(state);

        if was_signed_in {
            let _ = self.events.send(SessionEvent::SignedOut);
        }
        Ok(())
    }

    async fn update_identity(
        &self,
        id: Uuid,
        changes: &UpdateProfileDto,
    ) -> Result<Identity, BackendError> {
        self.record_call();
        let mut state = self.state.lock();

        if let Some(username) = &changes.username
            && state
                .accounts
                .iter()
                .any(|a| a.identity.id != id && &a.identity.username == username)
        {
            return Err(BackendError::Rejected("Username already taken".to_string()));
        }

        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.identity.id == id)
            .ok_or(BackendError::Unauthorized)?;
        IdentityChanges::from(changes.clone()).apply(&mut account.identity);
        Ok(account.identity.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
