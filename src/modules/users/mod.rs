//! Account administration. Every route is mounted behind the
//! super administrator layer.

pub mod controller;
pub mod router;
pub mod service;
