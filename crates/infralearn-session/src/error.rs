use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Rejected before reaching the backend, or rejected by it as invalid.
    #[error("{0}")]
    Validation(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("No profile exists for this account")]
    ProfileMissing,
    #[error("{0}")]
    Backend(String),
}

impl From<BackendError> for SessionError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::InvalidCredentials => SessionError::InvalidCredentials,
            BackendError::Unauthorized => SessionError::NotAuthenticated,
            BackendError::Rejected(message) => SessionError::Validation(message),
            BackendError::Unavailable(message) => SessionError::Backend(message),
        }
    }
}

/// Serializable result for UI layers: `{success:true}` or
/// `{success:false, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }
}

impl SessionError {
    pub fn envelope(&self) -> Outcome {
        Outcome {
            success: false,
            error: Some(self.to_string()),
        }
    }
}

impl<T> From<&Result<T, SessionError>> for Outcome {
    fn from(result: &Result<T, SessionError>) -> Self {
        match result {
            Ok(_) => Outcome::ok(),
            Err(err) => err.envelope(),
        }
    }
}
