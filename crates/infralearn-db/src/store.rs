use async_trait::async_trait;
use uuid::Uuid;

use infralearn_auth::Role;
use infralearn_models::Identity;
use infralearn_models::calendar::{Assignment, CalendarEvent, EventScope, NewAssignment, NewEvent};
use infralearn_models::chat::{Message, NewMessage};
use infralearn_models::courses::{Course, NewCourse, UpdateCourseDto};
use infralearn_models::enrollments::{Enrollment, EnrollmentStatus};
use infralearn_models::notifications::{NewNotification, Notification};
use infralearn_models::users::{IdentityChanges, NewIdentity};

use chrono::{DateTime, Utc};

use crate::StoreError;

/// An identity together with the secrets that never leave the server.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub identity: Identity,
    pub password_hash: String,
    pub token_version: i32,
}

/// Persistence used by the HTTP handlers.
///
/// Deleting a user removes everything that belongs to them (courses they
/// teach, enrollments, messages, notifications, events). Deleting a course
/// removes its enrollments, events and assignments.
#[async_trait]
pub trait Store: Send + Sync {
    // Identities

    /// Creates the account and its identity as one unit. Fails with
    /// [`StoreError::Conflict`] when the username or email is taken, in which
    /// case nothing is written.
    async fn register(&self, new: NewIdentity) -> Result<Identity, StoreError>;
    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>, StoreError>;
    async fn find_identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, StoreError>;
    async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, StoreError>;
    async fn find_credentials_by_id(&self, id: Uuid) -> Result<Option<Credentials>, StoreError>;
    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;
    async fn list_identities(&self, role: Option<Role>) -> Result<Vec<Identity>, StoreError>;
    async fn update_identity(
        &self,
        id: Uuid,
        changes: &IdentityChanges,
    ) -> Result<Option<Identity>, StoreError>;
    async fn update_identities(
        &self,
        ids: &[Uuid],
        changes: &IdentityChanges,
    ) -> Result<u64, StoreError>;
    async fn delete_identities(&self, ids: &[Uuid]) -> Result<u64, StoreError>;
    /// Invalidates every refresh token issued so far.
    async fn bump_token_version(&self, id: Uuid) -> Result<(), StoreError>;

    // Courses

    async fn create_course(&self, new: NewCourse) -> Result<Course, StoreError>;
    async fn list_courses(&self, professor_id: Option<Uuid>) -> Result<Vec<Course>, StoreError>;
    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, StoreError>;
    async fn update_course(
        &self,
        id: Uuid,
        changes: &UpdateCourseDto,
    ) -> Result<Option<Course>, StoreError>;
    async fn delete_course(&self, id: Uuid) -> Result<bool, StoreError>;

    // Enrollments

    async fn request_enrollment(
        &self,
        course_id: Uuid,
        student_id: Uuid,
    ) -> Result<Enrollment, StoreError>;
    async fn find_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>, StoreError>;
    async fn list_course_enrollments(&self, course_id: Uuid)
    -> Result<Vec<Enrollment>, StoreError>;
    async fn list_student_enrollments(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Enrollment>, StoreError>;
    async fn decide_enrollment(
        &self,
        id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<Option<Enrollment>, StoreError>;

    // Messages

    async fn send_message(&self, new: NewMessage) -> Result<Message, StoreError>;
    /// Both directions between `a` and `b`, oldest first.
    async fn conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>, StoreError>;
    /// Messages received by `user_id`, newest first.
    async fn inbox(&self, user_id: Uuid) -> Result<Vec<Message>, StoreError>;
    async fn mark_messages_read(&self, recipient_id: Uuid, ids: &[Uuid])
    -> Result<u64, StoreError>;

    // Notifications

    async fn create_notifications(
        &self,
        user_ids: &[Uuid],
        new: NewNotification,
    ) -> Result<Vec<Notification>, StoreError>;
    /// Newest first.
    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError>;
    async fn mark_notifications_read(
        &self,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, StoreError>;
    async fn delete_notification(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError>;

    // Calendar

    async fn create_event(&self, new: NewEvent) -> Result<CalendarEvent, StoreError>;
    /// Events in `scope` starting within `[from, to]`, earliest first.
    async fn list_events(
        &self,
        scope: &EventScope,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<CalendarEvent>, StoreError>;
    async fn find_event(&self, id: Uuid) -> Result<Option<CalendarEvent>, StoreError>;
    async fn delete_event(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn create_assignment(&self, new: NewAssignment) -> Result<Assignment, StoreError>;
    /// `None` lists every assignment; otherwise only those of the given
    /// courses. Earliest due first.
    async fn list_assignments(
        &self,
        course_ids: Option<&[Uuid]>,
    ) -> Result<Vec<Assignment>, StoreError>;
    async fn find_assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError>;
    async fn delete_assignment(&self, id: Uuid) -> Result<bool, StoreError>;
}
