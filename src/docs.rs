use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use infralearn_auth::Role;
use infralearn_core::ErrorResponse;
use infralearn_models::Identity;
use infralearn_models::auth::{
    LoginRequest, LoginResponse, MessageResponse, RefreshRequest, RefreshResponse, SignUpRequest,
    UsernameAvailability,
};
use infralearn_models::calendar::{
    AgendaItem, AgendaKind, Assignment, CalendarEvent, CreateAssignmentDto, CreateEventDto,
};
use infralearn_models::chat::{MarkMessagesReadDto, Message, SendMessageDto};
use infralearn_models::courses::{Course, CreateCourseDto, UpdateCourseDto};
use infralearn_models::enrollments::{DecideEnrollmentDto, Enrollment, EnrollmentStatus};
use infralearn_models::notifications::{
    MarkNotificationsReadDto, Notification, NotificationKind, SendNotificationDto,
};
use infralearn_models::users::{
    BulkDeleteUsersDto, BulkResult, BulkUpdateUsersDto, BulkUserUpdates, CreateUserDto,
    UpdateProfileDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::check_username,
        crate::modules::auth::controller::refresh,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::me,
        crate::modules::profile::controller::get_profile,
        crate::modules::profile::controller::update_profile,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::bulk_update_users,
        crate::modules::users::controller::bulk_delete_users,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::enrollments::controller::request_enrollment,
        crate::modules::enrollments::controller::get_course_enrollments,
        crate::modules::enrollments::controller::get_my_enrollments,
        crate::modules::enrollments::controller::decide_enrollment,
        crate::modules::chat::controller::get_inbox,
        crate::modules::chat::controller::get_conversation,
        crate::modules::chat::controller::send_message,
        crate::modules::chat::controller::mark_messages_read,
        crate::modules::notifications::controller::get_notifications,
        crate::modules::notifications::controller::send_notification,
        crate::modules::notifications::controller::mark_notifications_read,
        crate::modules::notifications::controller::delete_notification,
        crate::modules::calendar::controller::get_events,
        crate::modules::calendar::controller::create_event,
        crate::modules::calendar::controller::delete_event,
        crate::modules::calendar::controller::get_assignments,
        crate::modules::calendar::controller::create_assignment,
        crate::modules::calendar::controller::delete_assignment,
        crate::modules::calendar::controller::get_upcoming,
    ),
    components(
        schemas(
            Role,
            Identity,
            ErrorResponse,
            MessageResponse,
            LoginRequest,
            LoginResponse,
            RefreshRequest,
            RefreshResponse,
            SignUpRequest,
            UsernameAvailability,
            UpdateProfileDto,
            CreateUserDto,
            BulkUserUpdates,
            BulkUpdateUsersDto,
            BulkDeleteUsersDto,
            BulkResult,
            Course,
            CreateCourseDto,
            UpdateCourseDto,
            Enrollment,
            EnrollmentStatus,
            DecideEnrollmentDto,
            Message,
            SendMessageDto,
            MarkMessagesReadDto,
            Notification,
            NotificationKind,
            SendNotificationDto,
            MarkNotificationsReadDto,
            CalendarEvent,
            CreateEventDto,
            Assignment,
            CreateAssignmentDto,
            AgendaItem,
            AgendaKind,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Sign-in, sign-up and token management"),
        (name = "Profile", description = "The caller's own account"),
        (name = "Users", description = "Account administration (super admin only)"),
        (name = "Courses", description = "Course catalogue"),
        (name = "Enrollments", description = "Course enrollment requests and decisions"),
        (name = "Chat", description = "Direct messages between users"),
        (name = "Notifications", description = "Per-user notification feed"),
        (name = "Calendar", description = "Events, assignments and the upcoming agenda")
    ),
    info(
        title = "InfraLearn API",
        version = "0.1.0",
        description = "Role-based classroom backend for administrators, professors and students.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/auth/check-username",
            "/api/users/bulk",
            "/api/courses/{id}/enroll",
            "/api/enrollments/{id}",
            "/api/chat/messages/read",
            "/api/notifications/read",
            "/api/calendar/upcoming",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
