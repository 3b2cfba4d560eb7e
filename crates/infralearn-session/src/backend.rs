use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use infralearn_models::Identity;
use infralearn_models::auth::SignUpRequest;
use infralearn_models::users::UpdateProfileDto;

/// A signed-in account as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSession {
    pub user_id: Uuid,
    pub access_token: Option<String>,
}

/// Notifications about session changes that happen outside the store,
/// e.g. another window signing out or a token expiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    Expired,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Not authenticated")]
    Unauthorized,
    #[error("{0}")]
    Rejected(String),
    #[error("Authentication service unavailable: {0}")]
    Unavailable(String),
}

/// The identity provider and profile directory behind a [`SessionStore`].
///
/// [`SessionStore`]: crate::SessionStore
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// The session persisted from an earlier run, if still usable.
    async fn current_session(&self) -> Result<Option<BackendSession>, BackendError>;

    async fn sign_in(&self, username: &str, password: &str)
    -> Result<BackendSession, BackendError>;

    /// The identity record behind `session`; `None` when the account exists
    /// but its profile does not.
    async fn load_identity(
        &self,
        session: &BackendSession,
    ) -> Result<Option<Identity>, BackendError>;

    async fn username_taken(&self, username: &str) -> Result<bool, BackendError>;

    /// Creates account and identity atomically.
    async fn register(&self, request: &SignUpRequest) -> Result<Identity, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    async fn update_identity(
        &self,
        id: Uuid,
        changes: &UpdateProfileDto,
    ) -> Result<Identity, BackendError>;

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}
