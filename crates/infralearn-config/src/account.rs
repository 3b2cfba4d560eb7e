use std::env;

use crate::env_or;

/// Rules applied when accounts are created.
#[derive(Clone, Debug)]
pub struct AccountPolicy {
    /// Students must register with an address under this domain.
    pub institution_domain: String,
    pub bcrypt_cost: u32,
}

impl Default for AccountPolicy {
    fn default() -> Self {
        Self {
            institution_domain: "infralearn.edu".to_string(),
            bcrypt_cost: 12,
        }
    }
}

impl AccountPolicy {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            institution_domain: env::var("INSTITUTION_EMAIL_DOMAIN")
                .map(|d| d.trim().trim_start_matches('@').to_ascii_lowercase())
                .ok()
                .filter(|d| !d.is_empty())
                .unwrap_or(defaults.institution_domain),
            bcrypt_cost: env_or("BCRYPT_COST", defaults.bcrypt_cost).clamp(4, 31),
        }
    }

    /// True when the email's domain is the institution domain or one of its
    /// subdomains (`cs.infralearn.edu`).
    pub fn is_institutional(&self, email: &str) -> bool {
        let Some((_, domain)) = email.trim().rsplit_once('@') else {
            return false;
        };
        let domain = domain.to_ascii_lowercase();
        let expected = self.institution_domain.as_str();

        domain == expected
            || domain
                .strip_suffix(expected)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

/// Credentials of the super administrator seeded at startup.
#[derive(Clone, Debug)]
pub struct AdminSeedConfig {
    pub username: String,
    pub email: String,
    pub name: String,
    /// Seeding is skipped when unset.
    pub password: Option<String>,
}

impl AdminSeedConfig {
    pub fn from_env() -> Self {
        Self {
            username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@infralearn.edu".to_string()),
            name: env::var("ADMIN_NAME").unwrap_or_else(|_| "System Administrator".to_string()),
            password: env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn institutional_domain_matches_exactly_or_as_subdomain() {
        let policy = AccountPolicy::default();

        assert!(policy.is_institutional("ada@infralearn.edu"));
        assert!(policy.is_institutional("ada@CS.Infralearn.edu"));
        assert!(!policy.is_institutional("ada@gmail.com"));
        assert!(!policy.is_institutional("ada@notinfralearn.edu"));
        assert!(!policy.is_institutional("infralearn.edu"));
    }
}
