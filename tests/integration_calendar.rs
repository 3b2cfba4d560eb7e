mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use common::{TestApp, setup_test_app};
use infralearn_auth::Role;

/// A course taught by `turing` with `ada` approved and `grace` not enrolled.
struct Classroom {
    course_id: String,
    professor: String,
    student: String,
    outsider: String,
}

async fn classroom(app: &TestApp) -> Classroom {
    let (_, professor) = app.user_with_token("turing", Role::Professor).await;
    let (_, student) = app.user_with_token("ada", Role::Student).await;
    let (_, outsider) = app.user_with_token("grace", Role::Student).await;

    let (_, body) = app
        .post(
            "/api/courses",
            &professor,
            json!({ "code": "CS101", "title": "Computation" }),
        )
        .await;
    let course_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .send(
            "POST",
            &format!("/api/courses/{course_id}/enroll"),
            Some(&student),
            None,
        )
        .await;
    let enrollment_id = body["data"]["id"].as_str().unwrap();
    let (status, _) = app
        .patch(
            &format!("/api/enrollments/{enrollment_id}"),
            &professor,
            json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    Classroom {
        course_id,
        professor,
        student,
        outsider,
    }
}

fn in_days(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc3339()
}

fn titles(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_assignment_notifies_approved_students() {
    let app = setup_test_app().await;
    let class = classroom(&app).await;

    let (status, body) = app
        .post(
            "/api/calendar/assignments",
            &class.professor,
            json!({ "courseId": class.course_id, "title": "Problem set 1", "dueAt": in_days(3) }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["courseId"], class.course_id);

    let (_, body) = app.get("/api/notifications", &class.student).await;
    let assignment_notes: Vec<&Value> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["kind"] == "assignment")
        .collect();
    assert_eq!(assignment_notes.len(), 1);
    assert_eq!(assignment_notes[0]["title"], "New assignment in CS101");

    let (_, body) = app.get("/api/notifications", &class.outsider).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_assignment_requires_course_owner() {
    let app = setup_test_app().await;
    let class = classroom(&app).await;
    let (_, other) = app.user_with_token("hopper", Role::Professor).await;

    let body = json!({ "courseId": class.course_id, "title": "Sneaky", "dueAt": in_days(1) });

    let (status, _) = app
        .post("/api/calendar/assignments", &class.student, body.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post("/api/calendar/assignments", &other, body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_assignments_visible_only_to_enrolled_students() {
    let app = setup_test_app().await;
    let class = classroom(&app).await;
    app.post(
        "/api/calendar/assignments",
        &class.professor,
        json!({ "courseId": class.course_id, "title": "Essay", "dueAt": in_days(5) }),
    )
    .await;

    let (_, body) = app.get("/api/calendar/assignments", &class.student).await;
    assert_eq!(titles(&body), vec!["Essay"]);

    let (_, body) = app.get("/api/calendar/assignments", &class.outsider).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = app
        .get(
            &format!("/api/calendar/assignments?courseId={}", class.course_id),
            &class.outsider,
        )
        .await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let admin = app.admin_token().await;
    let (_, body) = app.get("/api/calendar/assignments", &admin).await;
    assert_eq!(titles(&body), vec!["Essay"]);
}

#[tokio::test]
async fn test_events_personal_and_course() {
    let app = setup_test_app().await;
    let class = classroom(&app).await;

    let (status, _) = app
        .post(
            "/api/calendar/events",
            &class.professor,
            json!({ "title": "Lecture", "startsAt": in_days(1), "courseId": class.course_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            "/api/calendar/events",
            &class.outsider,
            json!({ "title": "Gym", "startsAt": in_days(1) }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            "/api/calendar/events",
            &class.student,
            json!({ "title": "Fake lecture", "startsAt": in_days(1), "courseId": class.course_id }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.get("/api/calendar/events", &class.student).await;
    assert_eq!(titles(&body), vec!["Lecture"]);

    let (_, body) = app.get("/api/calendar/events", &class.outsider).await;
    assert_eq!(titles(&body), vec!["Gym"]);
}

#[tokio::test]
async fn test_event_time_range_is_checked() {
    let app = setup_test_app().await;
    let (_, token) = app.user_with_token("ada", Role::Student).await;

    let (status, body) = app
        .post(
            "/api/calendar/events",
            &token,
            json!({ "title": "Backwards", "startsAt": in_days(2), "endsAt": in_days(1) }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "endsAt must not be before startsAt");
}

#[tokio::test]
async fn test_delete_event_owner_only() {
    let app = setup_test_app().await;
    let (_, ada) = app.user_with_token("ada", Role::Student).await;
    let (_, grace) = app.user_with_token("grace", Role::Student).await;

    let (_, body) = app
        .post(
            "/api/calendar/events",
            &ada,
            json!({ "title": "Study group", "startsAt": in_days(1) }),
        )
        .await;
    let uri = format!("/api/calendar/events/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = app.delete(&uri, &grace).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&uri, &ada).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.delete(&uri, &ada).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Event not found");
}

#[tokio::test]
async fn test_upcoming_merges_in_chronological_order() {
    let app = setup_test_app().await;
    let class = classroom(&app).await;

    app.post(
        "/api/calendar/assignments",
        &class.professor,
        json!({ "courseId": class.course_id, "title": "Due soon", "dueAt": in_days(2) }),
    )
    .await;
    app.post(
        "/api/calendar/assignments",
        &class.professor,
        json!({ "courseId": class.course_id, "title": "Due later", "dueAt": in_days(30) }),
    )
    .await;
    app.post(
        "/api/calendar/events",
        &class.professor,
        json!({ "title": "Lecture", "startsAt": in_days(1), "courseId": class.course_id }),
    )
    .await;
    app.post(
        "/api/calendar/events",
        &class.student,
        json!({ "title": "Review", "startsAt": in_days(3) }),
    )
    .await;

    let (status, body) = app.get("/api/calendar/upcoming", &class.student).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), vec!["Lecture", "Due soon", "Review"]);
    assert_eq!(body["data"][1]["kind"], "assignment_due");

    let (_, body) = app
        .get("/api/calendar/upcoming?days=60", &class.student)
        .await;
    assert_eq!(
        titles(&body),
        vec!["Lecture", "Due soon", "Review", "Due later"]
    );

    let (_, body) = app.get("/api/calendar/upcoming", &class.outsider).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upcoming_days_range() {
    let app = setup_test_app().await;
    let (_, token) = app.user_with_token("ada", Role::Student).await;

    for days in ["0", "366", "-1"] {
        let (status, body) = app
            .get(&format!("/api/calendar/upcoming?days={days}"), &token)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "days must be between 1 and 365");
    }
}
