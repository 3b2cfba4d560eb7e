use std::sync::Arc;

use infralearn_auth::TokenCodec;
use infralearn_config::{AccountPolicy, ConfigError, CorsConfig, JwtConfig};
use infralearn_db::{MemoryStore, SharedStore};

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub tokens: TokenCodec,
    pub account_policy: AccountPolicy,
    pub cors_config: CorsConfig,
}

impl AppState {
    pub fn new(store: SharedStore, jwt_config: JwtConfig) -> Self {
        Self {
            store,
            tokens: TokenCodec::new(jwt_config),
            account_policy: AccountPolicy::default(),
            cors_config: CorsConfig::default(),
        }
    }

    pub fn with_account_policy(mut self, policy: AccountPolicy) -> Self {
        self.account_policy = policy;
        self
    }

    pub fn with_cors_config(mut self, cors_config: CorsConfig) -> Self {
        self.cors_config = cors_config;
        self
    }
}

/// Builds the state from the environment around an already opened store.
pub fn init_app_state(store: SharedStore) -> Result<AppState, ConfigError> {
    Ok(AppState::new(store, JwtConfig::from_env()?)
        .with_account_policy(AccountPolicy::from_env())
        .with_cors_config(CorsConfig::from_env()))
}

/// State over a fresh in-memory store, for tests and local experiments.
pub fn in_memory_state(jwt_config: JwtConfig) -> AppState {
    AppState::new(Arc::new(MemoryStore::new()), jwt_config)
}
