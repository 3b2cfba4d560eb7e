use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use infralearn_auth::Role;
use infralearn_models::Identity;
use infralearn_models::calendar::{Assignment, CalendarEvent, EventScope, NewAssignment, NewEvent};
use infralearn_models::chat::{Message, NewMessage};
use infralearn_models::courses::{Course, NewCourse, UpdateCourseDto};
use infralearn_models::enrollments::{Enrollment, EnrollmentStatus};
use infralearn_models::notifications::{NewNotification, Notification, NotificationKind};
use infralearn_models::users::{IdentityChanges, NewIdentity};

use crate::StoreError;
use crate::store::{Credentials, Store};

const IDENTITY_COLUMNS: &str = "id, username, name, email, role";
const CREDENTIAL_COLUMNS: &str = "id, username, name, email, role, password_hash, token_version";
const COURSE_COLUMNS: &str = "id, code, title, description, professor_id, created_at, updated_at";
const ENROLLMENT_COLUMNS: &str = "id, course_id, student_id, status, requested_at, decided_at";
const MESSAGE_COLUMNS: &str = "id, sender_id, recipient_id, content, created_at, read_at";
const NOTIFICATION_COLUMNS: &str = "id, user_id, title, body, kind, read, created_at";
const EVENT_COLUMNS: &str =
    "id, owner_id, course_id, title, description, starts_at, ends_at, created_at";
const ASSIGNMENT_COLUMNS: &str = "id, course_id, title, description, due_at, created_at";

#[derive(FromRow)]
struct IdentityRow {
    id: Uuid,
    username: String,
    name: String,
    email: String,
    role: String,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = StoreError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: row.id,
            username: row.username,
            name: row.name,
            email: row.email,
            role: row
                .role
                .parse::<Role>()
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    identity: IdentityRow,
    password_hash: String,
    token_version: i32,
}

impl TryFrom<CredentialsRow> for Credentials {
    type Error = StoreError;

    fn try_from(row: CredentialsRow) -> Result<Self, Self::Error> {
        Ok(Credentials {
            identity: row.identity.try_into()?,
            password_hash: row.password_hash,
            token_version: row.token_version,
        })
    }
}

#[derive(FromRow)]
struct CourseRow {
    id: Uuid,
    code: String,
    title: String,
    description: Option<String>,
    professor_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Course {
            id: row.id,
            code: row.code,
            title: row.title,
            description: row.description,
            professor_id: row.professor_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct EnrollmentRow {
    id: Uuid,
    course_id: Uuid,
    student_id: Uuid,
    status: String,
    requested_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
}

impl TryFrom<EnrollmentRow> for Enrollment {
    type Error = StoreError;

    fn try_from(row: EnrollmentRow) -> Result<Self, Self::Error> {
        Ok(Enrollment {
            id: row.id,
            course_id: row.course_id,
            student_id: row.student_id,
            status: row
                .status
                .parse::<EnrollmentStatus>()
                .map_err(StoreError::Corrupt)?,
            requested_at: row.requested_at,
            decided_at: row.decided_at,
        })
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    sender_id: Uuid,
    recipient_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            sender_id: row.sender_id,
            recipient_id: row.recipient_id,
            content: row.content,
            created_at: row.created_at,
            read_at: row.read_at,
        }
    }
}

#[derive(FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    body: String,
    kind: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            body: row.body,
            kind: NotificationKind::parse(&row.kind)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown kind: {}", row.kind)))?,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct EventRow {
    id: Uuid,
    owner_id: Uuid,
    course_id: Option<Uuid>,
    title: String,
    description: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for CalendarEvent {
    fn from(row: EventRow) -> Self {
        CalendarEvent {
            id: row.id,
            owner_id: row.owner_id,
            course_id: row.course_id,
            title: row.title,
            description: row.description,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct AssignmentRow {
    id: Uuid,
    course_id: Uuid,
    title: String,
    description: Option<String>,
    due_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<AssignmentRow> for Assignment {
    fn from(row: AssignmentRow) -> Self {
        Assignment {
            id: row.id,
            course_id: row.course_id,
            title: row.title,
            description: row.description,
            due_at: row.due_at,
            created_at: row.created_at,
        }
    }
}

/// Maps constraint violations onto the storage error taxonomy.
fn classify(err: sqlx::Error, conflict: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(conflict.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::Invalid("Referenced record does not exist".to_string());
        }
        if db_err.is_check_violation() {
            return StoreError::Invalid("Value violates a data constraint".to_string());
        }
    }
    StoreError::Database(err)
}

/// Emails are unique case-insensitively through this index.
const EMAIL_UNIQUE_INDEX: &str = "users_email_lower_key";

fn conflict_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(EMAIL_UNIQUE_INDEX) => "Email already registered",
        _ => "Username already taken",
    }
}

fn identity_conflict(err: sqlx::Error) -> StoreError {
    let message = match &err {
        sqlx::Error::Database(db_err) => conflict_message(db_err.constraint()),
        _ => conflict_message(None),
    };
    classify(err, message)
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    #[instrument(skip(self, new), fields(username = %new.username))]
    async fn register(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "INSERT INTO users (id, username, name, email, role, password_hash)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {IDENTITY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(&new.name)
        .bind(&new.email)
        .bind(new.role.as_str())
        .bind(&new.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(identity_conflict)?;

        tx.commit().await?;
        row.try_into()
    }

    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Identity::try_from)
        .transpose()
    }

    async fn find_identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, StoreError> {
        sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(Identity::try_from)
        .transpose()
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, StoreError> {
        sqlx::query_as::<_, CredentialsRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(Credentials::try_from)
        .transpose()
    }

    async fn find_credentials_by_id(&self, id: Uuid) -> Result<Option<Credentials>, StoreError> {
        sqlx::query_as::<_, CredentialsRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Credentials::try_from)
        .transpose()
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_identities(&self, role: Option<Role>) -> Result<Vec<Identity>, StoreError> {
        sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users
             WHERE ($1::TEXT IS NULL OR role = $1)
             ORDER BY username"
        ))
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Identity::try_from)
        .collect()
    }

    #[instrument(skip(self, changes))]
    async fn update_identity(
        &self,
        id: Uuid,
        changes: &IdentityChanges,
    ) -> Result<Option<Identity>, StoreError> {
        sqlx::query_as::<_, IdentityRow>(&format!(
            "UPDATE users SET
                username = COALESCE($2, username),
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                role = COALESCE($5, role),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {IDENTITY_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.username.as_deref())
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.role.map(|r| r.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(identity_conflict)?
        .map(Identity::try_from)
        .transpose()
    }

    #[instrument(skip(self, changes))]
    async fn update_identities(
        &self,
        ids: &[Uuid],
        changes: &IdentityChanges,
    ) -> Result<u64, StoreError> {
        if changes.username.is_some() || changes.email.is_some() {
            return Err(StoreError::Invalid(
                "Unique fields cannot be bulk updated".to_string(),
            ));
        }

        let result = sqlx::query(
            "UPDATE users SET
                name = COALESCE($2, name),
                role = COALESCE($3, role),
                updated_at = NOW()
             WHERE id = ANY($1)",
        )
        .bind(ids.to_vec())
        .bind(changes.name.as_deref())
        .bind(changes.role.map(|r| r.as_str()))
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "Conflicting update"))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_identities(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn bump_token_version(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET token_version = token_version + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, new), fields(code = %new.code))]
    async fn create_course(&self, new: NewCourse) -> Result<Course, StoreError> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "INSERT INTO courses (id, code, title, description, professor_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.code)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.professor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "A course with this code already exists"))?;
        Ok(row.into())
    }

    async fn list_courses(&self, professor_id: Option<Uuid>) -> Result<Vec<Course>, StoreError> {
        let rows = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses
             WHERE ($1::UUID IS NULL OR professor_id = $1)
             ORDER BY code"
        ))
        .bind(professor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Course::from).collect())
    }

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Course::from))
    }

    async fn update_course(
        &self,
        id: Uuid,
        changes: &UpdateCourseDto,
    ) -> Result<Option<Course>, StoreError> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "UPDATE courses SET
                code = COALESCE($2, code),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.code.as_deref())
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "A course with this code already exists"))?;
        Ok(row.map(Course::from))
    }

    async fn delete_course(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn request_enrollment(
        &self,
        course_id: Uuid,
        student_id: Uuid,
    ) -> Result<Enrollment, StoreError> {
        sqlx::query_as::<_, EnrollmentRow>(&format!(
            "INSERT INTO enrollments (id, course_id, student_id)
             VALUES ($1, $2, $3)
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "Enrollment already requested for this course"))?
        .try_into()
    }

    async fn find_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>, StoreError> {
        sqlx::query_as::<_, EnrollmentRow>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Enrollment::try_from)
        .transpose()
    }

    async fn list_course_enrollments(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<Enrollment>, StoreError> {
        sqlx::query_as::<_, EnrollmentRow>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
             WHERE course_id = $1 ORDER BY requested_at"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Enrollment::try_from)
        .collect()
    }

    async fn list_student_enrollments(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Enrollment>, StoreError> {
        sqlx::query_as::<_, EnrollmentRow>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
             WHERE student_id = $1 ORDER BY requested_at"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Enrollment::try_from)
        .collect()
    }

    #[instrument(skip(self))]
    async fn decide_enrollment(
        &self,
        id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<Option<Enrollment>, StoreError> {
        sqlx::query_as::<_, EnrollmentRow>(&format!(
            "UPDATE enrollments SET status = $2, decided_at = NOW()
             WHERE id = $1
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(Enrollment::try_from)
        .transpose()
    }

    async fn send_message(&self, new: NewMessage) -> Result<Message, StoreError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "INSERT INTO messages (id, sender_id, recipient_id, content)
             VALUES ($1, $2, $3, $4)
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.sender_id)
        .bind(new.recipient_id)
        .bind(&new.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "Duplicate message"))?;
        Ok(row.into())
    }

    async fn conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE (sender_id = $1 AND recipient_id = $2)
                OR (sender_id = $2 AND recipient_id = $1)
             ORDER BY created_at, id"
        ))
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn inbox(&self, user_id: Uuid) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE recipient_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn mark_messages_read(
        &self,
        recipient_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE messages SET read_at = NOW()
             WHERE recipient_id = $1 AND read_at IS NULL AND id = ANY($2)",
        )
        .bind(recipient_id)
        .bind(ids.to_vec())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, new))]
    async fn create_notifications(
        &self,
        user_ids: &[Uuid],
        new: NewNotification,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(user_ids.len());

        for user_id in user_ids {
            let row = sqlx::query_as::<_, NotificationRow>(&format!(
                "INSERT INTO notifications (id, user_id, title, body, kind)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING {NOTIFICATION_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&new.title)
            .bind(&new.body)
            .bind(new.kind.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| classify(e, "Duplicate notification"))?;
            created.push(Notification::try_from(row)?);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE user_id = $1 AND (NOT $2 OR read = FALSE)
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Notification::try_from)
        .collect()
    }

    async fn mark_notifications_read(
        &self,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE
             WHERE user_id = $1 AND read = FALSE AND id = ANY($2)",
        )
        .bind(user_id)
        .bind(ids.to_vec())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_event(&self, new: NewEvent) -> Result<CalendarEvent, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "INSERT INTO calendar_events (id, owner_id, course_id, title, description, starts_at, ends_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.owner_id)
        .bind(new.course_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "Duplicate event"))?;
        Ok(row.into())
    }

    async fn list_events(
        &self,
        scope: &EventScope,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<CalendarEvent>, StoreError> {
        let window = "($1::TIMESTAMPTZ IS NULL OR starts_at >= $1)
                      AND ($2::TIMESTAMPTZ IS NULL OR starts_at <= $2)";

        let rows = match scope {
            EventScope::All => {
                sqlx::query_as::<_, EventRow>(&format!(
                    "SELECT {EVENT_COLUMNS} FROM calendar_events
                     WHERE {window}
                     ORDER BY starts_at"
                ))
                .bind(from)
                .bind(to)
                .fetch_all(&self.pool)
                .await?
            }
            EventScope::Visible {
                user_id,
                course_ids,
            } => {
                sqlx::query_as::<_, EventRow>(&format!(
                    "SELECT {EVENT_COLUMNS} FROM calendar_events
                     WHERE {window}
                       AND ((course_id IS NULL AND owner_id = $3) OR course_id = ANY($4))
                     ORDER BY starts_at"
                ))
                .bind(from)
                .bind(to)
                .bind(user_id)
                .bind(course_ids.clone())
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(CalendarEvent::from).collect())
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<CalendarEvent>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM calendar_events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CalendarEvent::from))
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM calendar_events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_assignment(&self, new: NewAssignment) -> Result<Assignment, StoreError> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "INSERT INTO assignments (id, course_id, title, description, due_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.course_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.due_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "Duplicate assignment"))?;
        Ok(row.into())
    }

    async fn list_assignments(
        &self,
        course_ids: Option<&[Uuid]>,
    ) -> Result<Vec<Assignment>, StoreError> {
        let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments
             WHERE ($1::UUID[] IS NULL OR course_id = ANY($1))
             ORDER BY due_at"
        ))
        .bind(course_ids.map(|ids| ids.to_vec()))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Assignment::from).collect())
    }

    async fn find_assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Assignment::from))
    }

    async fn delete_assignment(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
