use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use infralearn_auth::Role;
use infralearn_config::AccountPolicy;

use crate::users::Identity;
use crate::validation::{describe, is_valid_username};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub refresh_token: String,
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub success: bool,
    pub token: String,
}

/// Self-service registration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SignUpRequest {
    #[validate(length(min = 3, max = 32, message = "Username must be between 3 and 32 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignUpRejection {
    #[error("{0}")]
    Invalid(String),
    #[error("Students must register with an @{0} email address")]
    NonInstitutionalEmail(String),
    #[error("The {0} role cannot be self-registered")]
    ReservedRole(Role),
}

impl SignUpRequest {
    /// Field and role rules. Runs before anything touches storage or the
    /// network, so a rejected request has no side effects.
    pub fn check(&self, policy: &AccountPolicy) -> Result<(), SignUpRejection> {
        self.validate()
            .map_err(|errors| SignUpRejection::Invalid(describe(&errors)))?;

        if !is_valid_username(&self.username) {
            return Err(SignUpRejection::Invalid(
                "Username may only contain letters, digits, '_', '.' and '-'".to_string(),
            ));
        }

        if !self.role.is_self_assignable() {
            return Err(SignUpRejection::ReservedRole(self.role));
        }

        if self.role == Role::Student && !policy.is_institutional(&self.email) {
            return Err(SignUpRejection::NonInstitutionalEmail(
                policy.institution_domain.clone(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsernameQuery {
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsernameAvailability {
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(role: Role, email: &str) -> SignUpRequest {
        SignUpRequest {
            username: "linus".to_string(),
            name: "Linus".to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            role,
        }
    }

    #[test]
    fn students_need_institutional_email() {
        let policy = AccountPolicy::default();

        assert_eq!(
            request(Role::Student, "linus@gmail.com").check(&policy),
            Err(SignUpRejection::NonInstitutionalEmail(
                "infralearn.edu".to_string()
            ))
        );
        assert!(request(Role::Student, "linus@infralearn.edu").check(&policy).is_ok());
    }

    #[test]
    fn professors_may_use_any_domain() {
        let policy = AccountPolicy::default();
        assert!(request(Role::Professor, "linus@gmail.com").check(&policy).is_ok());
    }

    #[test]
    fn super_admin_cannot_self_register() {
        let policy = AccountPolicy::default();
        assert_eq!(
            request(Role::SuperAdmin, "root@infralearn.edu").check(&policy),
            Err(SignUpRejection::ReservedRole(Role::SuperAdmin))
        );
    }

    #[test]
    fn field_rules_apply() {
        let policy = AccountPolicy::default();
        let mut short = request(Role::Professor, "linus@gmail.com");
        short.password = "123".to_string();

        assert_eq!(
            short.check(&policy),
            Err(SignUpRejection::Invalid(
                "Password must be at least 8 characters".to_string()
            ))
        );

        let mut spaced = request(Role::Professor, "linus@gmail.com");
        spaced.username = "li nus".to_string();
        assert!(matches!(spaced.check(&policy), Err(SignUpRejection::Invalid(_))));
    }
}
