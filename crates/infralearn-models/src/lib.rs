//! # InfraLearn Models
//!
//! Domain records and request/response DTOs shared by the HTTP layer, the
//! storage layer, and the session client.
//!
//! Wire format is camelCase JSON (`refreshToken`, `userIds`, `startsAt`).

pub mod auth;
pub mod calendar;
pub mod chat;
pub mod courses;
pub mod enrollments;
pub mod notifications;
pub mod users;
pub mod validation;

pub use infralearn_auth::Role;
pub use users::Identity;
