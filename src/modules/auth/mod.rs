//! Sign-in, self-registration, token refresh and sign-out.

pub mod controller;
pub mod router;
pub mod service;
