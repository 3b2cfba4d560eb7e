pub mod auth;
pub mod calendar;
pub mod chat;
pub mod courses;
pub mod enrollments;
pub mod notifications;
pub mod profile;
pub mod users;
