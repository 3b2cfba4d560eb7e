//! [`AuthBackend`] backed by a running InfraLearn server.

use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use infralearn_auth::is_expired;
use infralearn_models::Identity;
use infralearn_models::auth::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, SignUpRequest};
use infralearn_models::users::UpdateProfileDto;

use crate::backend::{AuthBackend, BackendError, BackendSession, SessionEvent};

/// Tokens kept between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTokens {
    user_id: Uuid,
    token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

#[derive(Deserialize)]
struct Availability {
    available: bool,
}

pub struct ApiBackend {
    client: Client,
    base_url: Url,
    session_file: Option<PathBuf>,
    tokens: Mutex<Option<StoredTokens>>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiBackend {
    /// `base_url` may carry a path prefix (`https://host/classroom`); API
    /// paths are resolved below it.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| BackendError::Unavailable(format!("Invalid server URL: {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let (events, _) = broadcast::channel(16);

        Ok(Self {
            client: Client::new(),
            base_url,
            session_file: None,
            tokens: Mutex::new(None),
            events,
        })
    }

    /// Persist tokens to `path` so a later process can restore the session.
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// `path` is relative, e.g. `api/auth/login`.
    fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Unavailable(e.to_string()))
    }

    fn access_token(&self) -> Option<String> {
        self.tokens.lock().as_ref().map(|t| t.token.clone())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorEnvelope>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());

        Err(match status {
            StatusCode::UNAUTHORIZED if message == "Invalid credentials" => {
                BackendError::InvalidCredentials
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized,
            s if s.is_client_error() => BackendError::Rejected(message),
            _ => BackendError::Unavailable(message),
        })
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Unavailable(format!("Malformed response: {e}")))
    }

    async fn load_tokens(&self) -> Option<StoredTokens> {
        if let Some(tokens) = self.tokens.lock().clone() {
            return Some(tokens);
        }

        let path = self.session_file.as_ref()?;
        let raw = tokio::fs::read(path).await.ok()?;
        match serde_json::from_slice::<StoredTokens>(&raw) {
            Ok(tokens) => {
                *self.tokens.lock() = Some(tokens.clone());
                Some(tokens)
            }
            Err(err) => {
                warn!(error = %err, path = %path.display(), "Ignoring unreadable session file");
                None
            }
        }
    }

    async fn store_tokens(&self, tokens: Option<StoredTokens>) {
        *self.tokens.lock() = tokens.clone();

        let Some(path) = &self.session_file else {
            return;
        };
        let result = match tokens {
            Some(tokens) => match serde_json::to_vec(&tokens) {
                Ok(raw) => tokio::fs::write(path, raw).await,
                Err(err) => {
                    warn!(error = %err, "Failed to encode session");
                    return;
                }
            },
            None => match tokio::fs::remove_file(path).await {
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(err) = result {
            warn!(error = %err, path = %path.display(), "Failed to update session file");
        }
    }

    async fn refresh(&self, tokens: &StoredTokens) -> Result<StoredTokens, BackendError> {
        let request = self.client.post(self.url("api/auth/refresh")?).json(&RefreshRequest {
            refresh_token: tokens.refresh_token.clone(),
        });
        let body: RefreshResponse = Self::read(self.send(request).await?).await?;

        Ok(StoredTokens {
            token: body.token,
            ..tokens.clone()
        })
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl AuthBackend for ApiBackend {
    async fn current_session(&self) -> Result<Option<BackendSession>, BackendError> {
        let Some(mut tokens) = self.load_tokens().await else {
            return Ok(None);
        };

        if is_expired(&tokens.token) {
            if is_expired(&tokens.refresh_token) {
                debug!("Stored session has fully expired");
                self.store_tokens(None).await;
                return Ok(None);
            }

            tokens = match self.refresh(&tokens).await {
                Ok(tokens) => tokens,
                Err(BackendError::Unavailable(message)) => {
                    return Err(BackendError::Unavailable(message));
                }
                Err(err) => {
                    debug!(error = %err, "Refresh rejected, discarding session");
                    self.store_tokens(None).await;
                    return Ok(None);
                }
            };
            self.store_tokens(Some(tokens.clone())).await;
        }

        Ok(Some(BackendSession {
            user_id: tokens.user_id,
            access_token: Some(tokens.token),
        }))
    }

    async fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> Result<BackendSession, BackendError> {
        let request = self.client.post(self.url("api/auth/login")?).json(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        });
        let body: LoginResponse = Self::read(self.send(request).await?).await?;

        let tokens = StoredTokens {
            user_id: body.user.id,
            token: body.token,
            refresh_token: body.refresh_token,
        };
        self.store_tokens(Some(tokens.clone())).await;
        self.emit(SessionEvent::SignedIn);

        Ok(BackendSession {
            user_id: tokens.user_id,
            access_token: Some(tokens.token),
        })
    }

    async fn load_identity(
        &self,
        session: &BackendSession,
    ) -> Result<Option<Identity>, BackendError> {
        let Some(token) = session.access_token.clone().or_else(|| self.access_token()) else {
            return Ok(None);
        };

        let request = self.client.get(self.url("api/auth/me")?).bearer_auth(token);
        match self.send(request).await {
            Ok(response) => {
                let body: DataEnvelope<Identity> = Self::read(response).await?;
                Ok(Some(body.data))
            }
            Err(BackendError::Rejected(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn username_taken(&self, username: &str) -> Result<bool, BackendError> {
        let url = Url::parse_with_params(
            self.url("api/auth/check-username")?.as_str(),
            &[("username", username)],
        )
        .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let body: DataEnvelope<Availability> =
            Self::read(self.send(self.client.get(url)).await?).await?;
        Ok(!body.data.available)
    }

    async fn register(&self, request: &SignUpRequest) -> Result<Identity, BackendError> {
        let request = self.client.post(self.url("api/auth/register")?).json(request);
        let body: DataEnvelope<Identity> = Self::read(self.send(request).await?).await?;
        Ok(body.data)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let Some(token) = self.access_token() else {
            return Ok(());
        };

        let request = self.client.post(self.url("api/auth/logout")?).bearer_auth(token);
        let result = self.send(request).await.map(|_| ());

        // The local tokens are discarded even when the server call fails.
        self.store_tokens(None).await;
        self.emit(SessionEvent::SignedOut);
        result
    }

    async fn update_identity(
        &self,
        _id: Uuid,
        changes: &UpdateProfileDto,
    ) -> Result<Identity, BackendError> {
        let token = self.access_token().ok_or(BackendError::Unauthorized)?;

        let request = self
            .client
            .put(self.url("api/profile")?)
            .bearer_auth(token)
            .json(changes);
        let body: DataEnvelope<Identity> = Self::read(self.send(request).await?).await?;
        Ok(body.data)
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
