mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::setup_test_app;
use infralearn_auth::Role;

#[tokio::test]
async fn test_send_message_and_read_conversation() {
    let app = setup_test_app().await;
    let (ada, ada_token) = app.user_with_token("ada", Role::Student).await;
    let (turing, turing_token) = app.user_with_token("turing", Role::Professor).await;

    let (status, body) = app
        .post(
            "/api/chat/messages",
            &ada_token,
            json!({ "recipientId": turing.id, "content": "When is the exam?" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["senderId"], ada.id.to_string());
    assert!(body["data"]["readAt"].is_null());

    let (status, _) = app
        .post(
            "/api/chat/messages",
            &turing_token,
            json!({ "recipientId": ada.id, "content": "Friday." }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .get(&format!("/api/chat/messages?with={}", turing.id), &ada_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["data"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "When is the exam?");
    assert_eq!(messages[1]["content"], "Friday.");

    let (_, body) = app.get("/api/chat/inbox", &turing_token).await;
    let inbox = body["data"].as_array().unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0]["content"], "When is the exam?");
}

#[tokio::test]
async fn test_message_notifies_recipient() {
    let app = setup_test_app().await;
    let (_, ada_token) = app.user_with_token("ada", Role::Student).await;
    let (turing, turing_token) = app.user_with_token("turing", Role::Professor).await;

    app.post(
        "/api/chat/messages",
        &ada_token,
        json!({ "recipientId": turing.id, "content": "Hello" }),
    )
    .await;

    let (_, body) = app.get("/api/notifications", &turing_token).await;
    let notifications = body["data"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "message");
    assert_eq!(notifications[0]["title"], "New message from ada");
    assert_eq!(notifications[0]["body"], "Hello");
}

#[tokio::test]
async fn test_message_rules() {
    let app = setup_test_app().await;
    let (ada, token) = app.user_with_token("ada", Role::Student).await;

    let (status, body) = app
        .post(
            "/api/chat/messages",
            &token,
            json!({ "recipientId": ada.id, "content": "Note to self" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot send a message to yourself");

    let (status, body) = app
        .post(
            "/api/chat/messages",
            &token,
            json!({ "recipientId": uuid::Uuid::new_v4(), "content": "Anyone?" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Recipient not found");

    let (status, body) = app.get("/api/chat/messages", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "with is required");
}

#[tokio::test]
async fn test_mark_messages_read_only_affects_own_inbox() {
    let app = setup_test_app().await;
    let (_, ada_token) = app.user_with_token("ada", Role::Student).await;
    let (turing, turing_token) = app.user_with_token("turing", Role::Professor).await;

    let (_, body) = app
        .post(
            "/api/chat/messages",
            &ada_token,
            json!({ "recipientId": turing.id, "content": "Hi" }),
        )
        .await;
    let message_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .patch(
            "/api/chat/messages/read",
            &ada_token,
            json!({ "messageIds": [message_id] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["affected"], 0);

    let (_, body) = app
        .patch(
            "/api/chat/messages/read",
            &turing_token,
            json!({ "messageIds": message_id }),
        )
        .await;
    assert_eq!(body["data"]["affected"], 1);

    let (status, body) = app
        .patch("/api/chat/messages/read", &turing_token, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message IDs are required");
}

#[tokio::test]
async fn test_staff_broadcasts_notifications() {
    let app = setup_test_app().await;
    let (_, professor) = app.user_with_token("turing", Role::Professor).await;
    let (ada, ada_token) = app.user_with_token("ada", Role::Student).await;
    let (grace, _) = app.user_with_token("grace", Role::Student).await;

    let (status, body) = app
        .post(
            "/api/notifications",
            &professor,
            json!({ "userIds": [ada.id, grace.id, ada.id], "title": "Room change", "body": "Lab 2" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = app
        .post(
            "/api/notifications",
            &ada_token,
            json!({ "userIds": [grace.id], "title": "Hi", "body": "Hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.get("/api/notifications?unreadOnly=true", &ada_token).await;
    let notifications = body["data"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "general");
    let id = notifications[0]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .patch(
            "/api/notifications/read",
            &ada_token,
            json!({ "notificationIds": [id] }),
        )
        .await;
    assert_eq!(body["data"]["affected"], 1);

    let (_, body) = app.get("/api/notifications?unreadOnly=true", &ada_token).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = app.delete(&format!("/api/notifications/{id}"), &ada_token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.delete(&format!("/api/notifications/{id}"), &ada_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Notification not found");
}
