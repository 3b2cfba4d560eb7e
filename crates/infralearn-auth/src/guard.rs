//! Request-level authentication helpers shared by the HTTP layer.
//!
//! Authentication always runs before authorization: a request without a
//! valid token is answered with 401 before any role is looked at, and only
//! an authenticated caller with the wrong role sees 403.

use axum::http::{HeaderMap, header};

use infralearn_core::AppError;

use crate::claims::AccessClaims;
use crate::jwt::TokenCodec;
use crate::role::{Role, describe_roles};

const BEARER_PREFIX: &str = "Bearer ";

/// Returns the token from an `Authorization: Bearer <token>` header.
///
/// The prefix match is exact and case-sensitive; `bearer x`, `Bearer` and
/// `Basic x` all yield `None`.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
}

/// Extracts and verifies the bearer token. Never fails loudly: any problem
/// yields `None` and the caller decides how to respond.
pub fn verify_token(headers: &HeaderMap, codec: &TokenCodec) -> Option<AccessClaims> {
    let token = extract_token(headers)?;
    codec.verify_access(token).ok()
}

pub fn has_role(claims: &AccessClaims, roles: &[Role]) -> bool {
    roles.contains(&claims.role)
}

pub fn is_admin(claims: &AccessClaims) -> bool {
    claims.role == Role::SuperAdmin
}

pub fn is_professor(claims: &AccessClaims) -> bool {
    claims.role == Role::Professor
}

pub fn is_student(claims: &AccessClaims) -> bool {
    claims.role == Role::Student
}

/// 401 with the uniform error body.
pub fn auth_error(message: &str) -> AppError {
    AppError::unauthorized(message.to_string())
}

/// 403 naming the roles that would have been accepted.
pub fn role_error(roles: &[Role]) -> AppError {
    AppError::forbidden(format!(
        "Access denied. Required role: {}",
        describe_roles(roles)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use infralearn_config::JwtConfig;
    use uuid::Uuid;

    use crate::claims::Subject;

    fn codec() -> TokenCodec {
        TokenCodec::new(JwtConfig {
            access_secret: "guard_access_secret".to_string(),
            refresh_secret: "guard_refresh_secret".to_string(),
            access_token_expiry: 600,
            refresh_token_expiry: 6000,
        })
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn claims(role: Role) -> AccessClaims {
        AccessClaims {
            sub: Uuid::new_v4(),
            username: "grace".to_string(),
            email: "grace@infralearn.edu".to_string(),
            role,
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(extract_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn prefix_is_case_sensitive() {
        assert_eq!(extract_token(&headers_with("bearer abc")), None);
        assert_eq!(extract_token(&headers_with("BEARER abc")), None);
        assert_eq!(extract_token(&headers_with("Basic abc")), None);
        assert_eq!(extract_token(&headers_with("Bearer ")), None);
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }

    #[test]
    fn verify_token_accepts_valid_and_rejects_garbage() {
        let codec = codec();
        let subject = Subject {
            id: Uuid::new_v4(),
            username: "grace".to_string(),
            email: "grace@infralearn.edu".to_string(),
            role: Role::Professor,
        };
        let token = codec.issue_access(&subject).unwrap();

        let verified = verify_token(&headers_with(&format!("Bearer {token}")), &codec).unwrap();
        assert_eq!(verified.subject(), subject);

        assert!(verify_token(&headers_with("Bearer nope"), &codec).is_none());
        assert!(verify_token(&headers_with(&format!("bearer {token}")), &codec).is_none());
    }

    #[test]
    fn role_membership_is_exact() {
        let admin = claims(Role::SuperAdmin);
        let professor = claims(Role::Professor);

        assert!(has_role(&admin, &[Role::SuperAdmin]));
        assert!(!has_role(&professor, &[Role::SuperAdmin]));
        assert!(has_role(&professor, &[Role::SuperAdmin, Role::Professor]));
        assert!(!has_role(&professor, &[]));

        assert!(is_admin(&admin));
        assert!(is_professor(&professor));
        assert!(is_student(&claims(Role::Student)));
    }

    #[test]
    fn error_builders_use_expected_statuses() {
        assert_eq!(auth_error("No token provided").status, StatusCode::UNAUTHORIZED);

        let err = role_error(&[Role::SuperAdmin]);
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(
            err.public_message(),
            "Access denied. Required role: super_admin"
        );
    }
}
