use std::sync::OnceLock;

use bcrypt::{hash, verify};

use crate::errors::AppError;

pub use bcrypt::DEFAULT_COST;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::upstream(anyhow::anyhow!("Failed to hash password: {e}")))
}

/// A malformed stored hash counts as a mismatch rather than an error so that
/// login keeps a single failure path.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    verify(password, hashed).unwrap_or(false)
}

/// Burns the same bcrypt work as [`verify_password`] for a login whose
/// username does not exist. Always returns `false`.
///
/// The throwaway hash is built once per process at the first `cost` seen.
pub fn verify_unknown_user(password: &str, cost: u32) -> bool {
    match dummy_hash(cost) {
        Some(hashed) => {
            let _ = verify_password(password, hashed);
        }
        None => tracing::warn!("Could not build the unknown-user hash"),
    }
    false
}

fn dummy_hash(cost: u32) -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash("infralearn-unknown-user", cost).ok())
        .as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash_password("admin123", 4).unwrap();

        assert_ne!(hashed, "admin123");
        assert!(verify_password("admin123", &hashed));
        assert!(!verify_password("admin124", &hashed));
    }

    #[test]
    fn garbage_hash_does_not_verify() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn unknown_user_verification_does_real_work_and_fails() {
        assert!(!verify_unknown_user("admin123", 4));

        let hashed = dummy_hash(4).unwrap();
        assert!(hashed.starts_with("$2b$04$"));
        assert!(verify("infralearn-unknown-user", hashed).unwrap());
    }
}
