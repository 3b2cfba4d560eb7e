//! # InfraLearn Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: access and refresh token signing
//! - [`cors`]: allowed origins
//! - [`server`]: bind address and metrics port
//! - [`database`]: storage selection and pool sizing
//! - [`account`]: sign-up rules and the seeded administrator
//!
//! # Example
//!
//! ```ignore
//! use infralearn_config::{JwtConfig, CorsConfig, AccountPolicy};
//!
//! let jwt_config = JwtConfig::from_env()?;
//! let cors_config = CorsConfig::from_env();
//! let policy = AccountPolicy::from_env();
//! ```

pub mod account;
pub mod cors;
pub mod database;
pub mod jwt;
pub mod server;

use thiserror::Error;

pub use account::{AccountPolicy, AdminSeedConfig};
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("JWT_SECRET and JWT_REFRESH_SECRET must differ")]
    SharedSecret,
}

pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
