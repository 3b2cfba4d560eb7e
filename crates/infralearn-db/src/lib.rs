//! # InfraLearn DB
//!
//! Storage for the InfraLearn API behind the [`Store`] trait, with two
//! backends:
//!
//! - [`PgStore`]: PostgreSQL via sqlx, migrations embedded from `migrations/`
//! - [`MemoryStore`]: in-process tables for development and tests
//!
//! [`connect`] picks the backend from [`DatabaseConfig`]: a configured
//! `DATABASE_URL` selects Postgres, otherwise the in-memory store is used.

pub mod memory;
pub mod postgres;
pub mod seed;
pub mod store;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use infralearn_config::DatabaseConfig;
use infralearn_core::AppError;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use seed::{SeedOutcome, seed_admin};
pub use sqlx::PgPool;
pub use store::{Credentials, Store};

pub type SharedStore = Arc<dyn Store>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) | StoreError::Invalid(message) => {
                AppError::bad_request(message)
            }
            StoreError::NotFound(message) => AppError::not_found(message),
            other => AppError::upstream(other),
        }
    }
}

pub async fn init_db_pool(url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}

/// Opens the configured backend, running migrations for Postgres.
pub async fn connect(config: &DatabaseConfig) -> Result<SharedStore, StoreError> {
    match &config.url {
        Some(url) => {
            let pool = init_db_pool(url, config.max_connections).await?;
            run_migrations(&pool).await?;
            tracing::info!("Connected to PostgreSQL storage");
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (data is not persisted)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
