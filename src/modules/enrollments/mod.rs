//! Enrollment requests and their approval. Students request, the course's
//! professor (or an administrator) decides, and the student is notified.

pub mod controller;
pub mod router;
pub mod service;
