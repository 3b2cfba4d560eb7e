use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use infralearn_auth::guard::{self, is_admin};
use infralearn_auth::{AccessClaims, Role, auth_error};
use infralearn_core::AppError;

use crate::state::AppState;

/// Extractor that validates the bearer token and exposes its claims.
///
/// The role is taken from the token as issued; a role change reaches the
/// caller once the current token expires.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AccessClaims);

impl AuthUser {
    pub fn user_id(&self) -> Uuid {
        self.0.sub
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    pub fn username(&self) -> &str {
        &self.0.username
    }

    pub fn has_role(&self, roles: &[Role]) -> bool {
        guard::has_role(&self.0, roles)
    }

    pub fn is_admin(&self) -> bool {
        is_admin(&self.0)
    }

    /// Administrators act on anything; everyone else only on what they own.
    pub fn owns_or_admin(&self, owner_id: Uuid) -> bool {
        self.is_admin() || self.user_id() == owner_id
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if guard::extract_token(&parts.headers).is_none() {
            return Err(auth_error("Authentication required"));
        }

        guard::verify_token(&parts.headers, &state.tokens)
            .map(AuthUser)
            .ok_or_else(|| auth_error("Invalid or expired token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser(AccessClaims {
            sub: Uuid::new_v4(),
            username: "ada".to_string(),
            email: "ada@infralearn.edu".to_string(),
            role,
            exp: 9999999999,
            iat: 1234567890,
        })
    }

    #[test]
    fn test_has_role() {
        let professor = user(Role::Professor);

        assert!(professor.has_role(&[Role::Professor]));
        assert!(professor.has_role(&[Role::SuperAdmin, Role::Professor]));
        assert!(!professor.has_role(&[Role::Student]));
        assert!(!professor.has_role(&[]));
    }

    #[test]
    fn test_owns_or_admin() {
        let professor = user(Role::Professor);
        let admin = user(Role::SuperAdmin);
        let someone_else = Uuid::new_v4();

        assert!(professor.owns_or_admin(professor.user_id()));
        assert!(!professor.owns_or_admin(someone_else));
        assert!(admin.owns_or_admin(someone_else));
    }
}
