use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::role::Role;

/// What an access token asserts about its bearer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Claims of the short-lived access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

impl AccessClaims {
    pub fn subject(&self) -> Subject {
        Subject {
            id: self.sub,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Claims of the refresh token. Only the identity and its token version are
/// carried; everything else is reloaded when the token is exchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub token_version: i32,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}
