use tracing::{info, warn};

use infralearn_auth::Role;
use infralearn_config::AdminSeedConfig;
use infralearn_core::{AppError, hash_password};
use infralearn_models::Identity;
use infralearn_models::users::NewIdentity;

use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Created(Identity),
    AlreadyPresent,
    /// No password configured.
    Skipped,
}

/// Ensures the configured super administrator exists. The account is an
/// ordinary identity: it signs in through the normal credential check.
pub async fn seed_admin(
    store: &dyn Store,
    config: &AdminSeedConfig,
    bcrypt_cost: u32,
) -> Result<SeedOutcome, AppError> {
    let Some(password) = &config.password else {
        warn!("ADMIN_PASSWORD not set, skipping administrator seeding");
        return Ok(SeedOutcome::Skipped);
    };

    if store.username_exists(&config.username).await? {
        return Ok(SeedOutcome::AlreadyPresent);
    }

    let identity = store
        .register(NewIdentity {
            username: config.username.clone(),
            name: config.name.clone(),
            email: config.email.clone(),
            role: Role::SuperAdmin,
            password_hash: hash_password(password, bcrypt_cost)?,
        })
        .await?;

    info!(username = %identity.username, "Seeded super administrator");
    Ok(SeedOutcome::Created(identity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn config(password: Option<&str>) -> AdminSeedConfig {
        AdminSeedConfig {
            username: "admin".to_string(),
            email: "admin@infralearn.edu".to_string(),
            name: "Admin".to_string(),
            password: password.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn seeds_once() {
        let store = MemoryStore::new();

        let first = seed_admin(&store, &config(Some("admin123")), 4).await.unwrap();
        let SeedOutcome::Created(admin) = first else {
            panic!("expected the administrator to be created");
        };
        assert_eq!(admin.role, Role::SuperAdmin);

        let second = seed_admin(&store, &config(Some("admin123")), 4).await.unwrap();
        assert_eq!(second, SeedOutcome::AlreadyPresent);
    }

    #[tokio::test]
    async fn skips_without_password() {
        let store = MemoryStore::new();
        let outcome = seed_admin(&store, &config(None), 4).await.unwrap();

        assert_eq!(outcome, SeedOutcome::Skipped);
        assert!(!store.username_exists("admin").await.unwrap());
    }
}
