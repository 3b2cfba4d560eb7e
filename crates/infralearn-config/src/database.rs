use std::env;

use crate::env_or;

#[derive(Clone, Debug, Default)]
pub struct DatabaseConfig {
    /// `None` selects the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()),
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
        }
    }
}
