//! # InfraLearn Session
//!
//! Client-side authentication state for applications built on InfraLearn.
//!
//! A [`SessionStore`] is created explicitly with an [`AuthBackend`], started
//! with [`SessionStore::init`] and stopped with [`SessionStore::teardown`].
//! Two backends ship with the crate:
//!
//! - [`ApiBackend`]: talks to an InfraLearn server over HTTP and can persist
//!   its tokens in a file between runs
//! - [`MemoryBackend`]: an in-process provider for tests and demos
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use infralearn_config::AccountPolicy;
//! use infralearn_session::{ApiBackend, SessionStore};
//!
//! let backend = ApiBackend::new("http://localhost:3000")?.with_session_file("session.json");
//! let store = SessionStore::new(Arc::new(backend), AccountPolicy::from_env());
//! store.init().await;
//!
//! if !store.is_authenticated() {
//!     store.sign_in("admin", "secret").await?;
//! }
//! ```

pub mod api;
pub mod backend;
pub mod error;
pub mod memory;
pub mod store;

pub use api::ApiBackend;
pub use backend::{AuthBackend, BackendError, BackendSession, SessionEvent};
pub use error::{Outcome, SessionError};
pub use memory::MemoryBackend;
pub use store::{SessionState, SessionStore};
