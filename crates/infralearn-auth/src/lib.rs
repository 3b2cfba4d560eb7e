//! # InfraLearn Auth
//!
//! Roles, credentials, and request authentication for the InfraLearn API.
//!
//! - [`role`]: the closed [`Role`] enum
//! - [`claims`]: access and refresh token claims
//! - [`jwt`]: [`TokenCodec`] for issuing and verifying tokens
//! - [`guard`]: bearer extraction, role predicates, and the 401/403 builders
//!
//! Access tokens carry `{sub, username, email, role, exp, iat}` and are
//! trusted for their whole lifetime: a role change only takes effect once the
//! bearer's current token expires.

pub mod claims;
pub mod guard;
pub mod jwt;
pub mod role;

pub use claims::{AccessClaims, RefreshClaims, Subject};
pub use guard::{auth_error, extract_token, has_role, role_error, verify_token};
pub use jwt::{TokenCodec, TokenError, is_expired};
pub use role::{Role, UnknownRole};
