//! Application error type with HTTP response conversion.
//!
//! Every failure that reaches a handler boundary is an [`AppError`]: an HTTP
//! status paired with an [`anyhow::Error`]. The response body is always the
//! uniform envelope
//!
//! ```json
//! { "success": false, "error": "<message>", "status": 401 }
//! ```
//!
//! Server-side failures (5xx) never echo their cause to the client; the
//! detail is logged and a generic message is returned instead.

use std::fmt::{Debug, Display};

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub status: u16,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    fn with_message<M>(status: StatusCode, message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::new(status, Error::msg(message))
    }

    /// 400: a required field is missing or a value is malformed.
    pub fn bad_request<M>(message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::with_message(StatusCode::BAD_REQUEST, message)
    }

    /// 401: the caller could not be authenticated.
    pub fn unauthorized<M>(message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::with_message(StatusCode::UNAUTHORIZED, message)
    }

    /// Uniform authentication failure with the default message.
    pub fn auth() -> Self {
        Self::unauthorized("Authentication required")
    }

    /// 403: authenticated, but not allowed.
    pub fn forbidden<M>(message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::with_message(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found<M>(message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::with_message(StatusCode::NOT_FOUND, message)
    }

    /// 500 caused by a dependency (database, token signer, hashing).
    pub fn upstream<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    /// Message that will be sent to the client.
    pub fn public_message(&self) -> String {
        if self.status.is_server_error() {
            INTERNAL_MESSAGE.to_string()
        } else {
            self.error.to_string()
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.error)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), error = ?self.error, "Request failed");
        }

        let body = Json(ErrorResponse {
            success: false,
            error: self.public_message(),
            status: self.status.as_u16(),
        });

        (self.status, body).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::upstream(err)
    }
}
