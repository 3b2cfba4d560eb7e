mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{TestApp, setup_test_app};
use infralearn_auth::Role;

async fn create_course(app: &TestApp, token: &str, code: &str) -> Value {
    let (status, body) = app
        .post(
            "/api/courses",
            token,
            json!({ "code": code, "title": "Distributed Systems" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

#[tokio::test]
async fn test_professor_creates_own_course() {
    let app = setup_test_app().await;
    let (professor, token) = app.user_with_token("turing", Role::Professor).await;

    let course = create_course(&app, &token, "CS101").await;

    assert_eq!(course["code"], "CS101");
    assert_eq!(course["professorId"], professor.id.to_string());
}

#[tokio::test]
async fn test_student_cannot_create_course() {
    let app = setup_test_app().await;
    let (_, token) = app.user_with_token("ada", Role::Student).await;

    let (status, body) = app
        .post("/api/courses", &token, json!({ "code": "CS101", "title": "Nope" }))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "Access denied. Required role: super_admin or professor"
    );
}

#[tokio::test]
async fn test_admin_must_name_a_professor() {
    let app = setup_test_app().await;
    let admin = app.admin_token().await;
    let professor = app.create_user("turing", Role::Professor).await;
    let student = app.create_user("ada", Role::Student).await;

    let (status, body) = app
        .post("/api/courses", &admin, json!({ "code": "CS101", "title": "Intro" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "professorId is required");

    let (status, body) = app
        .post(
            "/api/courses",
            &admin,
            json!({ "code": "CS101", "title": "Intro", "professorId": student.id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "professorId must refer to a professor");

    let (status, body) = app
        .post(
            "/api/courses",
            &admin,
            json!({ "code": "CS101", "title": "Intro", "professorId": professor.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["professorId"], professor.id.to_string());
}

#[tokio::test]
async fn test_only_owner_or_admin_manages_course() {
    let app = setup_test_app().await;
    let (_, owner) = app.user_with_token("turing", Role::Professor).await;
    let (_, other) = app.user_with_token("hopper", Role::Professor).await;
    let admin = app.admin_token().await;
    let course = create_course(&app, &owner, "CS101").await;
    let uri = format!("/api/courses/{}", course["id"].as_str().unwrap());

    let (status, body) = app
        .send("PUT", &uri, Some(&other), Some(json!({ "title": "Hijacked" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "Access denied. Only the course professor or an administrator can manage this course"
    );

    let (status, body) = app
        .send("PUT", &uri, Some(&owner), Some(json!({ "title": "Renamed" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Renamed");

    let (status, _) = app.delete(&uri, &admin).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get(&uri, &owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Course not found");
}

#[tokio::test]
async fn test_enrollment_flow_notifies_both_sides() {
    let app = setup_test_app().await;
    let (_, professor) = app.user_with_token("turing", Role::Professor).await;
    let (student, student_token) = app.user_with_token("ada", Role::Student).await;
    let course = create_course(&app, &professor, "CS101").await;
    let course_id = course["id"].as_str().unwrap();

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/courses/{course_id}/enroll"),
            Some(&student_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");
    let enrollment_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = app.get("/api/notifications", &professor).await;
    let notifications = body["data"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "enrollment");

    let (status, body) = app
        .get(&format!("/api/courses/{course_id}/enrollments"), &professor)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["studentId"], student.id.to_string());

    let (status, body) = app
        .patch(
            &format!("/api/enrollments/{enrollment_id}"),
            &professor,
            json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "approved");

    let (_, body) = app.get("/api/notifications", &student_token).await;
    let notifications = body["data"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["title"], "Enrollment approved");
    assert_eq!(notifications[0]["body"], "Your enrollment in CS101 was approved");

    let (_, body) = app.get("/api/enrollments/mine", &student_token).await;
    assert_eq!(body["data"][0]["status"], "approved");
}

#[tokio::test]
async fn test_enrollment_rules() {
    let app = setup_test_app().await;
    let (_, professor) = app.user_with_token("turing", Role::Professor).await;
    let (_, other) = app.user_with_token("hopper", Role::Professor).await;
    let (_, student) = app.user_with_token("ada", Role::Student).await;
    let course = create_course(&app, &professor, "CS101").await;
    let enroll_uri = format!("/api/courses/{}/enroll", course["id"].as_str().unwrap());

    let (status, body) = app.send("POST", &enroll_uri, Some(&professor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied. Required role: student");

    let (_, body) = app.send("POST", &enroll_uri, Some(&student), None).await;
    let enrollment_uri = format!("/api/enrollments/{}", body["data"]["id"].as_str().unwrap());

    let (status, body) = app.send("POST", &enroll_uri, Some(&student), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Enrollment already requested for this course");

    let (status, body) = app
        .patch(&enrollment_uri, &professor, json!({ "status": "pending" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Status must be approved or rejected");

    let (status, _) = app
        .patch(&enrollment_uri, &other, json!({ "status": "approved" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/courses/{}/enroll", uuid::Uuid::new_v4()),
            Some(&student),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Course not found");
}

#[tokio::test]
async fn test_list_courses_by_professor() {
    let app = setup_test_app().await;
    let (turing, turing_token) = app.user_with_token("turing", Role::Professor).await;
    let (_, hopper_token) = app.user_with_token("hopper", Role::Professor).await;
    let (_, student) = app.user_with_token("ada", Role::Student).await;
    create_course(&app, &turing_token, "CS101").await;
    create_course(&app, &turing_token, "CS102").await;
    create_course(&app, &hopper_token, "CS201").await;

    let (_, body) = app.get("/api/courses", &student).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, body) = app
        .get(&format!("/api/courses?professorId={}", turing.id), &student)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}
