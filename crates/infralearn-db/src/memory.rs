//! In-process storage for development and tests.
//!
//! All tables live behind one lock, so every operation (including the
//! cascading deletes) is atomic with respect to the others. Contents are lost
//! when the process exits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use infralearn_auth::Role;
use infralearn_models::Identity;
use infralearn_models::calendar::{Assignment, CalendarEvent, EventScope, NewAssignment, NewEvent};
use infralearn_models::chat::{Message, NewMessage};
use infralearn_models::courses::{Course, NewCourse, UpdateCourseDto};
use infralearn_models::enrollments::{Enrollment, EnrollmentStatus};
use infralearn_models::notifications::{NewNotification, Notification};
use infralearn_models::users::{IdentityChanges, NewIdentity};

use crate::StoreError;
use crate::store::{Credentials, Store};

#[derive(Debug, Clone)]
struct UserRecord {
    identity: Identity,
    password_hash: String,
    token_version: i32,
}

impl UserRecord {
    fn credentials(&self) -> Credentials {
        Credentials {
            identity: self.identity.clone(),
            password_hash: self.password_hash.clone(),
            token_version: self.token_version,
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<UserRecord>,
    courses: Vec<Course>,
    enrollments: Vec<Enrollment>,
    messages: Vec<Message>,
    notifications: Vec<Notification>,
    events: Vec<CalendarEvent>,
    assignments: Vec<Assignment>,
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.identity.id == id)
    }

    fn user_exists(&self, id: Uuid) -> bool {
        self.user(id).is_some()
    }

    fn course_exists(&self, id: Uuid) -> bool {
        self.courses.iter().any(|c| c.id == id)
    }

    /// Rejects a username/email already held by someone other than `except`.
    fn check_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        except: Option<Uuid>,
    ) -> Result<(), StoreError> {
        for record in self.users.iter().filter(|u| Some(u.identity.id) != except) {
            if username.is_some_and(|name| record.identity.username == name) {
                return Err(StoreError::Conflict("Username already taken".to_string()));
            }
            if email.is_some_and(|email| record.identity.email.eq_ignore_ascii_case(email)) {
                return Err(StoreError::Conflict("Email already registered".to_string()));
            }
        }
        Ok(())
    }

    fn remove_courses(&mut self, ids: &[Uuid]) {
        self.courses.retain(|c| !ids.contains(&c.id));
        self.enrollments.retain(|e| !ids.contains(&e.course_id));
        self.assignments.retain(|a| !ids.contains(&a.course_id));
        self.events
            .retain(|e| e.course_id.is_none_or(|course_id| !ids.contains(&course_id)));
    }

    fn remove_users(&mut self, ids: &[Uuid]) -> u64 {
        let before = self.users.len();
        self.users.retain(|u| !ids.contains(&u.identity.id));
        let removed = (before - self.users.len()) as u64;

        let taught: Vec<Uuid> = self
            .courses
            .iter()
            .filter(|c| ids.contains(&c.professor_id))
            .map(|c| c.id)
            .collect();
        self.remove_courses(&taught);

        self.enrollments.retain(|e| !ids.contains(&e.student_id));
        self.messages
            .retain(|m| !ids.contains(&m.sender_id) && !ids.contains(&m.recipient_id));
        self.notifications.retain(|n| !ids.contains(&n.user_id));
        self.events.retain(|e| !ids.contains(&e.owner_id));

        removed
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn in_window(at: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    from.is_none_or(|from| at >= from) && to.is_none_or(|to| at <= to)
}

#[async_trait]
impl Store for MemoryStore {
    async fn register(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        let mut tables = self.tables.write();
        tables.check_unique(Some(&new.username), Some(&new.email), None)?;

        let identity = Identity {
            id: Uuid::new_v4(),
            username: new.username,
            name: new.name,
            email: new.email,
            role: new.role,
        };
        tables.users.push(UserRecord {
            identity: identity.clone(),
            password_hash: new.password_hash,
            token_version: 0,
        });

        Ok(identity)
    }

    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        Ok(self.tables.read().user(id).map(|u| u.identity.clone()))
    }

    async fn find_identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, StoreError> {
        Ok(self
            .tables
            .read()
            .users
            .iter()
            .find(|u| u.identity.username == username)
            .map(|u| u.identity.clone()))
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, StoreError> {
        Ok(self
            .tables
            .read()
            .users
            .iter()
            .find(|u| u.identity.username == username)
            .map(UserRecord::credentials))
    }

    async fn find_credentials_by_id(&self, id: Uuid) -> Result<Option<Credentials>, StoreError> {
        Ok(self.tables.read().user(id).map(UserRecord::credentials))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .read()
            .users
            .iter()
            .any(|u| u.identity.username == username))
    }

    async fn list_identities(&self, role: Option<Role>) -> Result<Vec<Identity>, StoreError> {
        let mut identities: Vec<Identity> = self
            .tables
            .read()
            .users
            .iter()
            .filter(|u| role.is_none_or(|role| u.identity.role == role))
            .map(|u| u.identity.clone())
            .collect();
        identities.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(identities)
    }

    async fn update_identity(
        &self,
        id: Uuid,
        changes: &IdentityChanges,
    ) -> Result<Option<Identity>, StoreError> {
        let mut tables = self.tables.write();
        if !tables.user_exists(id) {
            return Ok(None);
        }
        tables.check_unique(changes.username.as_deref(), changes.email.as_deref(), Some(id))?;

        let record = tables
            .users
            .iter_mut()
            .find(|u| u.identity.id == id)
            .ok_or_else(|| StoreError::NotFound("User not found".to_string()))?;
        changes.apply(&mut record.identity);
        Ok(Some(record.identity.clone()))
    }

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

        let mut tables = self.tables.write();
        let mut affected = 0;
        for record in tables.users.iter_mut().filter(|u| ids.contains(&u.identity.id)) {
            changes.apply(&mut record.identity);
            affected += 1;
        }
        Ok(affected)
    }

    async fn delete_identities(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        Ok(self.tables.write().remove_users(ids))
    }

    async fn bump_token_version(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if let Some(record) = tables.users.iter_mut().find(|u| u.identity.id == id) {
            record.token_version += 1;
        }
        Ok(())
    }

    async fn create_course(&self, new: NewCourse) -> Result<Course, StoreError> {
        let mut tables = self.tables.write();
        if !tables.user_exists(new.professor_id) {
            return Err(StoreError::Invalid("Professor does not exist".to_string()));
        }
        if tables.courses.iter().any(|c| c.code == new.code) {
            return Err(StoreError::Conflict(
                "A course with this code already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            code: new.code,
            title: new.title,
            description: new.description,
            professor_id: new.professor_id,
            created_at: now,
            updated_at: now,
        };
        tables.courses.push(course.clone());
        Ok(course)
    }

    async fn list_courses(&self, professor_id: Option<Uuid>) -> Result<Vec<Course>, StoreError> {
        let mut courses: Vec<Course> = self
            .tables
            .read()
            .courses
            .iter()
            .filter(|c| professor_id.is_none_or(|id| c.professor_id == id))
            .cloned()
            .collect();
        courses.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(courses)
    }

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        Ok(self
            .tables
            .read()
            .courses
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn update_course(
        &self,
        id: Uuid,
        changes: &UpdateCourseDto,
    ) -> Result<Option<Course>, StoreError> {
        let mut tables = self.tables.write();
        if let Some(code) = &changes.code
            && tables.courses.iter().any(|c| c.id != id && &c.code == code)
        {
            return Err(StoreError::Conflict(
                "A course with this code already exists".to_string(),
            ));
        }

        Ok(tables.courses.iter_mut().find(|c| c.id == id).map(|course| {
            changes.apply(course);
            course.updated_at = Utc::now();
            course.clone()
        }))
    }

    async fn delete_course(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write();
        if !tables.course_exists(id) {
            return Ok(false);
        }
        tables.remove_courses(&[id]);
        Ok(true)
    }

    async fn request_enrollment(
        &self,
        course_id: Uuid,
        student_id: Uuid,
    ) -> Result<Enrollment, StoreError> {
        let mut tables = self.tables.write();
        if !tables.course_exists(course_id) || !tables.user_exists(student_id) {
            return Err(StoreError::Invalid(
                "Course or student does not exist".to_string(),
            ));
        }
        if tables
            .enrollments
            .iter()
            .any(|e| e.course_id == course_id && e.student_id == student_id)
        {
            return Err(StoreError::Conflict(
                "Enrollment already requested for this course".to_string(),
            ));
        }

        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            course_id,
            student_id,
            status: EnrollmentStatus::Pending,
            requested_at: Utc::now(),
            decided_at: None,
        };
        tables.enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn find_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>, StoreError> {
        Ok(self
            .tables
            .read()
            .enrollments
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn list_course_enrollments(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<Enrollment>, StoreError> {
        Ok(self
            .tables
            .read()
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn list_student_enrollments(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Enrollment>, StoreError> {
        Ok(self
            .tables
            .read()
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn decide_enrollment(
        &self,
        id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<Option<Enrollment>, StoreError> {
        let mut tables = self.tables.write();
        Ok(tables
            .enrollments
            .iter_mut()
            .find(|e| e.id == id)
            .map(|enrollment| {
                enrollment.status = status;
                enrollment.decided_at = Some(Utc::now());
                enrollment.clone()
            }))
    }

    async fn send_message(&self, new: NewMessage) -> Result<Message, StoreError> {
        let mut tables = self.tables.write();
        if !tables.user_exists(new.recipient_id) {
            return Err(StoreError::Invalid("Recipient does not exist".to_string()));
        }

        let message = Message {
            id: Uuid::new_v4(),
            sender_id: new.sender_id,
            recipient_id: new.recipient_id,
            content: new.content,
            created_at: Utc::now(),
            read_at: None,
        };
        tables.messages.push(message.clone());
        Ok(message)
    }

    async fn conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>, StoreError> {
        Ok(self
            .tables
            .read()
            .messages
            .iter()
            .filter(|m| {
                (m.sender_id == a && m.recipient_id == b) || (m.sender_id == b && m.recipient_id == a)
            })
            .cloned()
            .collect())
    }

    async fn inbox(&self, user_id: Uuid) -> Result<Vec<Message>, StoreError> {
        Ok(self
            .tables
            .read()
            .messages
            .iter()
            .rev()
            .filter(|m| m.recipient_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_messages_read(
        &self,
        recipient_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, StoreError> {
        let mut tables = self.tables.write();
        let now = Utc::now();
        let mut affected = 0;
        for message in tables.messages.iter_mut().filter(|m| {
            m.recipient_id == recipient_id && m.read_at.is_none() && ids.contains(&m.id)
        }) {
            message.read_at = Some(now);
            affected += 1;
        }
        Ok(affected)
    }

    async fn create_notifications(
        &self,
        user_ids: &[Uuid],
        new: NewNotification,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut tables = self.tables.write();
        if let Some(missing) = user_ids.iter().find(|id| !tables.user_exists(**id)) {
            return Err(StoreError::Invalid(format!("User {missing} does not exist")));
        }

        let now = Utc::now();
        let created: Vec<Notification> = user_ids
            .iter()
            .map(|user_id| Notification {
                id: Uuid::new_v4(),
                user_id: *user_id,
                title: new.title.clone(),
                body: new.body.clone(),
                kind: new.kind,
                read: false,
                created_at: now,
            })
            .collect();
        tables.notifications.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        Ok(self
            .tables
            .read()
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
            .cloned()
            .collect())
    }

    async fn mark_notifications_read(
        &self,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, StoreError> {
        let mut tables = self.tables.write();
        let mut affected = 0;
        for notification in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.read && ids.contains(&n.id))
        {
            notification.read = true;
            affected += 1;
        }
        Ok(affected)
    }

    async fn delete_notification(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write();
        let before = tables.notifications.len();
        tables
            .notifications
            .retain(|n| !(n.id == id && n.user_id == user_id));
        Ok(tables.notifications.len() < before)
    }

    async fn create_event(&self, new: NewEvent) -> Result<CalendarEvent, StoreError> {
        let mut tables = self.tables.write();
        if let Some(course_id) = new.course_id
            && !tables.course_exists(course_id)
        {
            return Err(StoreError::Invalid("Course does not exist".to_string()));
        }

        let event = CalendarEvent {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            course_id: new.course_id,
            title: new.title,
            description: new.description,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            created_at: Utc::now(),
        };
        tables.events.push(event.clone());
        Ok(event)
    }

    async fn list_events(
        &self,
        scope: &EventScope,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<CalendarEvent>, StoreError> {
        let mut events: Vec<CalendarEvent> = self
            .tables
            .read()
            .events
            .iter()
            .filter(|e| scope.includes(e) && in_window(e.starts_at, from, to))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.starts_at);
        Ok(events)
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<CalendarEvent>, StoreError> {
        Ok(self
            .tables
            .read()
            .events
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write();
        let before = tables.events.len();
        tables.events.retain(|e| e.id != id);
        Ok(tables.events.len() < before)
    }

    async fn create_assignment(&self, new: NewAssignment) -> Result<Assignment, StoreError> {
        let mut tables = self.tables.write();
        if !tables.course_exists(new.course_id) {
            return Err(StoreError::Invalid("Course does not exist".to_string()));
        }

        let assignment = Assignment {
            id: Uuid::new_v4(),
            course_id: new.course_id,
            title: new.title,
            description: new.description,
            due_at: new.due_at,
            created_at: Utc::now(),
        };
        tables.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn list_assignments(
        &self,
        course_ids: Option<&[Uuid]>,
    ) -> Result<Vec<Assignment>, StoreError> {
        let mut assignments: Vec<Assignment> = self
            .tables
            .read()
            .assignments
            .iter()
            .filter(|a| course_ids.is_none_or(|ids| ids.contains(&a.course_id)))
            .cloned()
            .collect();
        assignments.sort_by_key(|a| a.due_at);
        Ok(assignments)
    }

    async fn find_assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError> {
        Ok(self
            .tables
            .read()
            .assignments
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn delete_assignment(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write();
        let before = tables.assignments.len();
        tables.assignments.retain(|a| a.id != id);
        Ok(tables.assignments.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_identity(username: &str, role: Role) -> NewIdentity {
        NewIdentity {
            username: username.to_string(),
            name: username.to_uppercase(),
            email: format!("{username}@infralearn.edu"),
            role,
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username_without_writing() {
        let store = MemoryStore::new();
        store.register(new_identity("ada", Role::Student)).await.unwrap();

        let mut duplicate = new_identity("ada", Role::Professor);
        duplicate.email = "other@infralearn.edu".to_string();
        let err = store.register(duplicate).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.list_identities(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn email_uniqueness_ignores_case() {
        let store = MemoryStore::new();
        store.register(new_identity("ada", Role::Student)).await.unwrap();

        let mut shouting = new_identity("grace", Role::Student);
        shouting.email = "ADA@InfraLearn.edu".to_string();
        let err = store.register(shouting).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict(m) if m == "Email already registered"));
    }

    #[tokio::test]
    async fn token_version_bumps() {
        let store = MemoryStore::new();
        let ada = store.register(new_identity("ada", Role::Student)).await.unwrap();

        store.bump_token_version(ada.id).await.unwrap();
        let creds = store.find_credentials_by_id(ada.id).await.unwrap().unwrap();
        assert_eq!(creds.token_version, 1);
    }

    #[tokio::test]
    async fn deleting_a_professor_cascades_to_courses() {
        let store = MemoryStore::new();
        let prof = store
            .register(new_identity("turing", Role::Professor))
            .await
            .unwrap();
        let student = store.register(new_identity("ada", Role::Student)).await.unwrap();

        let course = store
            .create_course(NewCourse {
                code: "CS101".to_string(),
                title: "Computation".to_string(),
                description: None,
                professor_id: prof.id,
            })
            .await
            .unwrap();
        store.request_enrollment(course.id, student.id).await.unwrap();
        store
            .create_assignment(NewAssignment {
                course_id: course.id,
                title: "Tape machines".to_string(),
                description: None,
                due_at: Utc::now() + Duration::days(3),
            })
            .await
            .unwrap();

        assert_eq!(store.delete_identities(&[prof.id]).await.unwrap(), 1);
        assert!(store.find_course(course.id).await.unwrap().is_none());
        assert!(store.list_student_enrollments(student.id).await.unwrap().is_empty());
        assert!(store.list_assignments(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bulk_update_refuses_unique_fields() {
        let store = MemoryStore::new();
        let ada = store.register(new_identity("ada", Role::Student)).await.unwrap();

        let changes = IdentityChanges {
            username: Some("same".to_string()),
            ..Default::default()
        };
        assert!(store.update_identities(&[ada.id], &changes).await.is_err());

        let changes = IdentityChanges {
            role: Some(Role::Professor),
            ..Default::default()
        };
        assert_eq!(store.update_identities(&[ada.id], &changes).await.unwrap(), 1);
        assert_eq!(
            store.find_identity(ada.id).await.unwrap().unwrap().role,
            Role::Professor
        );
    }

    #[tokio::test]
    async fn conversation_is_ordered_and_bidirectional() {
        let store = MemoryStore::new();
        let a = store.register(new_identity("a1", Role::Student)).await.unwrap();
        let b = store.register(new_identity("b1", Role::Professor)).await.unwrap();

        for (from, to, text) in [(a.id, b.id, "hi"), (b.id, a.id, "hello"), (a.id, b.id, "q?")] {
            store
                .send_message(NewMessage {
                    sender_id: from,
                    recipient_id: to,
                    content: text.to_string(),
                })
                .await
                .unwrap();
        }

        let thread = store.conversation(b.id, a.id).await.unwrap();
        let texts: Vec<&str> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["hi", "hello", "q?"]);

        let inbox = store.inbox(b.id).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].content, "q?");
    }
}
