//! # InfraLearn Core
//!
//! Foundational types shared by every InfraLearn crate:
//!
//! - [`errors`]: [`AppError`] and the `{success:false, error, status}` error body
//! - [`response`]: the `{success:true, data}` success envelope
//! - [`password`]: bcrypt hashing and verification
//! - [`serde`]: request helpers such as [`OneOrMany`]

pub mod errors;
pub mod password;
pub mod response;
pub mod serde;

pub use errors::{AppError, ErrorResponse};
pub use password::{hash_password, verify_password, verify_unknown_user};
pub use response::ApiResponse;
pub use crate::serde::OneOrMany;
