//! Signing and verification of access and refresh tokens.
//!
//! Both token kinds are HS256 JWTs, but they are signed with different
//! secrets so that a refresh token can never be replayed as an access token
//! (and vice versa).
//!
//! # Example
//!
//! ```ignore
//! use infralearn_auth::{Subject, TokenCodec};
//! use infralearn_config::JwtConfig;
//!
//! let codec = TokenCodec::new(JwtConfig::from_env()?);
//! let token = codec.issue_access(&subject)?;
//! let claims = codec.verify_access(&token)?;
//! assert_eq!(claims.subject(), subject);
//! ```

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

use infralearn_config::JwtConfig;
use infralearn_core::AppError;

use crate::claims::{AccessClaims, RefreshClaims, Subject};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signing key is not configured")]
    MissingSigningKey,
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("Invalid or expired token")]
    InvalidToken,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => AppError::unauthorized(err.to_string()),
            TokenError::MissingSigningKey | TokenError::Signing(_) => AppError::upstream(err),
        }
    }
}

/// Issues and verifies the tokens handed out at login.
#[derive(Clone, Debug)]
pub struct TokenCodec {
    config: JwtConfig,
}

impl TokenCodec {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Signs an access token for `subject`, valid for the configured access
    /// lifetime.
    ///
    /// # Errors
    ///
    /// [`TokenError::MissingSigningKey`] when the access secret is empty. This
    /// is a configuration fault, not something a caller can recover from.
    pub fn issue_access(&self, subject: &Subject) -> Result<String, TokenError> {
        let now = now();
        let claims = AccessClaims {
            sub: subject.id,
            username: subject.username.clone(),
            email: subject.email.clone(),
            role: subject.role,
            iat: now,
            exp: now + self.config.access_token_expiry.max(0) as usize,
        };

        sign(&claims, &self.config.access_secret)
    }

    /// Signs a refresh token bound to the identity's current token version.
    pub fn issue_refresh(&self, user_id: Uuid, token_version: i32) -> Result<String, TokenError> {
        let now = now();
        let claims = RefreshClaims {
            sub: user_id,
            token_version,
            iat: now,
            exp: now + self.config.refresh_token_expiry.max(0) as usize,
            jti: Uuid::new_v4().to_string(),
        };

        sign(&claims, &self.config.refresh_secret)
    }

    /// Checks signature and expiry of an access token.
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidToken`] for a bad signature, a malformed token or
    /// an expired one.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        verify(token, &self.config.access_secret)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        verify(token, &self.config.refresh_secret)
    }

    pub fn access_token_expiry(&self) -> i64 {
        self.config.access_token_expiry
    }
}

/// Reports whether `token` is past its `exp` claim without checking the
/// signature. Only suitable for UI hints such as skipping a doomed session
/// restore; never for authorization. Unreadable tokens count as expired.
pub fn is_expired(token: &str) -> bool {
    #[derive(Deserialize)]
    struct Expiry {
        exp: usize,
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    match decode::<Expiry>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data.claims.exp <= now(),
        Err(_) => true,
    }
}

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn sign<T: serde::Serialize>(claims: &T, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSigningKey);
    }

    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSigningKey);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| TokenError::InvalidToken)
}
