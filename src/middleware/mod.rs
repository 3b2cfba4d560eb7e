//! Request authentication and role checks.
//!
//! - [`auth`]: the [`AuthUser`](auth::AuthUser) extractor
//! - [`role`]: role extractors, the `require_roles` route layer and helpers
//!   for checks inside handlers
//!
//! Every role check first resolves `AuthUser`, so an anonymous caller gets
//! 401 before any role is considered and only a signed-in caller with the
//! wrong role gets 403.
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::AuthUser;
//! use crate::middleware::role::RequireStaff;
//!
//! async fn get_profile(auth_user: AuthUser) -> impl IntoResponse { /* any signed-in user */ }
//!
//! async fn create_course(RequireStaff(auth_user): RequireStaff) -> impl IntoResponse {
//!     // professors and super administrators only
//! }
//! ```

pub mod auth;
pub mod role;
