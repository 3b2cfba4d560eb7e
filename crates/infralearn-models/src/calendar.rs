use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// `None` for a personal event.
    pub course_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub owner_id: Uuid,
    pub course_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Which events a caller may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventScope {
    All,
    /// Personal events of `user_id` plus events of the listed courses.
    Visible { user_id: Uuid, course_ids: Vec<Uuid> },
}

impl EventScope {
    pub fn includes(&self, event: &CalendarEvent) -> bool {
        match self {
            EventScope::All => true,
            EventScope::Visible {
                user_id,
                course_ids,
            } => match event.course_id {
                Some(course_id) => course_ids.contains(&course_id),
                None => event.owner_id == *user_id,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventFilterParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentDto {
    pub course_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AssignmentFilterParams {
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UpcomingParams {
    /// Look-ahead window in days (default 7).
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgendaKind {
    Event,
    AssignmentDue,
}

/// One line of the merged agenda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgendaItem {
    pub kind: AgendaKind,
    pub id: Uuid,
    pub course_id: Option<Uuid>,
    pub title: String,
    pub at: DateTime<Utc>,
}

impl From<&CalendarEvent> for AgendaItem {
    fn from(event: &CalendarEvent) -> Self {
        AgendaItem {
            kind: AgendaKind::Event,
            id: event.id,
            course_id: event.course_id,
            title: event.title.clone(),
            at: event.starts_at,
        }
    }
}

impl From<&Assignment> for AgendaItem {
    fn from(assignment: &Assignment) -> Self {
        AgendaItem {
            kind: AgendaKind::AssignmentDue,
            id: assignment.id,
            course_id: Some(assignment.course_id),
            title: assignment.title.clone(),
            at: assignment.due_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(owner_id: Uuid, course_id: Option<Uuid>) -> CalendarEvent {
        CalendarEvent {
            id: Uuid::new_v4(),
            owner_id,
            course_id,
            title: "Office hours".to_string(),
            description: None,
            starts_at: Utc::now(),
            ends_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn visible_scope_covers_own_and_course_events() {
        let me = Uuid::new_v4();
        let course = Uuid::new_v4();
        let scope = EventScope::Visible {
            user_id: me,
            course_ids: vec![course],
        };

        assert!(scope.includes(&event(me, None)));
        assert!(scope.includes(&event(Uuid::new_v4(), Some(course))));
        assert!(!scope.includes(&event(Uuid::new_v4(), None)));
        assert!(!scope.includes(&event(me, Some(Uuid::new_v4()))));
        assert!(EventScope::All.includes(&event(Uuid::new_v4(), None)));
    }
}
