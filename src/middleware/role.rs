//! Role-based authorization for Axum.
//!
//! Three ways to gate a route:
//! 1. Route layers: [`require_super_admin`] (or [`require_roles`] directly)
//! 2. Extractors: [`RequireSuperAdmin`], [`RequireStaff`], [`RequireStudent`]
//! 3. Checks inside handler logic: [`check_role`], [`check_any_role`]

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use infralearn_auth::{Role, role_error};
use infralearn_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Authenticates the request, then lets it through only when the caller's
/// role is one of `allowed_roles`.
pub async fn require_roles(
    state: &AppState,
    req: Request,
    next: Next,
    allowed_roles: &[Role],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, state).await?;
    check_any_role(&auth_user, allowed_roles)?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(auth_user);
    Ok(next.run(req).await)
}

/// Route layer for administrator-only routers.
///
/// ```rust,ignore
/// use axum::{Router, middleware};
/// use crate::middleware::role::require_super_admin;
///
/// let admin_routes = Router::new()
///     .route("/users", get(list_users))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_super_admin));
/// ```
pub async fn require_super_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match require_roles(&state, req, next, &[Role::SuperAdmin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Declares an extractor that resolves [`AuthUser`] and then requires one of
/// the listed roles.
#[macro_export]
macro_rules! require_role {
    ($name:ident, [$($role:expr),+ $(,)?]) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = infralearn_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;
                $crate::middleware::role::check_any_role(&auth_user, &[$($role),+])?;
                Ok($name(auth_user))
            }
        }
    };
}

require_role!(RequireSuperAdmin, [Role::SuperAdmin]);
require_role!(RequireStaff, [Role::SuperAdmin, Role::Professor]);
require_role!(RequireStudent, [Role::Student]);

pub fn check_role(auth_user: &AuthUser, required_role: Role) -> Result<(), AppError> {
    check_any_role(auth_user, &[required_role])
}

pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[Role]) -> Result<(), AppError> {
    if !auth_user.has_role(allowed_roles) {
        return Err(role_error(allowed_roles));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use infralearn_auth::AccessClaims;
    use uuid::Uuid;

    fn user(role: Role) -> AuthUser {
        AuthUser(AccessClaims {
            sub: Uuid::new_v4(),
            username: "grace".to_string(),
            email: "grace@infralearn.edu".to_string(),
            role,
            exp: 9999999999,
            iat: 1234567890,
        })
    }

    #[test]
    fn test_check_role() {
        assert!(check_role(&user(Role::Student), Role::Student).is_ok());

        let err = check_role(&user(Role::Student), Role::SuperAdmin).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(
            err.public_message(),
            "Access denied. Required role: super_admin"
        );
    }

    #[test]
    fn test_check_any_role() {
        let staff = [Role::SuperAdmin, Role::Professor];

        assert!(check_any_role(&user(Role::Professor), &staff).is_ok());
        assert!(check_any_role(&user(Role::SuperAdmin), &staff).is_ok());

        let err = check_any_role(&user(Role::Student), &staff).unwrap_err();
        assert_eq!(
            err.public_message(),
            "Access denied. Required role: super_admin or professor"
        );
    }
}
