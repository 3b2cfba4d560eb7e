use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::{Router, middleware};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use infralearn::middleware::role::{RequireStaff, RequireStudent, require_super_admin};
use infralearn::state::{AppState, in_memory_state};
use infralearn_auth::{Role, Subject};
use infralearn_config::JwtConfig;

fn state() -> AppState {
    in_memory_state(JwtConfig {
        access_secret: "unit-access".to_string(),
        refresh_secret: "unit-refresh".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 3600,
    })
}

fn token_for(state: &AppState, role: Role) -> String {
    state
        .tokens
        .issue_access(&Subject {
            id: Uuid::new_v4(),
            username: "tester".to_string(),
            email: "tester@infralearn.edu".to_string(),
            role,
        })
        .unwrap()
}

fn app(state: AppState) -> Router {
    let admin_only = Router::new()
        .route("/admin", get(|| async { "admin" }))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_super_admin,
        ));

    Router::new()
        .merge(admin_only)
        .route("/staff", get(|RequireStaff(_): RequireStaff| async { "staff" }))
        .route(
            "/student",
            get(|RequireStudent(_): RequireStudent| async { "student" }),
        )
        .with_state(state)
}

async fn call(state: &AppState, uri: &str, token: Option<&str>) -> (StatusCode, String) {
    let mut request = Request::builder().uri(uri);
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {token}"));
    }

    let response = app(state.clone())
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_missing_token_is_401_not_403() {
    let state = state();

    for uri in ["/admin", "/staff", "/student"] {
        let (status, body) = call(&state, uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert!(body.contains("Authentication required"));
    }
}

#[tokio::test]
async fn test_wrong_role_is_403() {
    let state = state();
    let student = token_for(&state, Role::Student);
    let professor = token_for(&state, Role::Professor);

    let (status, body) = call(&state, "/admin", Some(&professor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Access denied. Required role: super_admin"));

    let (status, _) = call(&state, "/staff", Some(&student)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&state, "/student", Some(&professor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Access denied. Required role: student"));
}

#[tokio::test]
async fn test_allowed_roles_pass() {
    let state = state();
    let admin = token_for(&state, Role::SuperAdmin);
    let professor = token_for(&state, Role::Professor);
    let student = token_for(&state, Role::Student);

    assert_eq!(call(&state, "/admin", Some(&admin)).await.0, StatusCode::OK);
    assert_eq!(call(&state, "/staff", Some(&admin)).await.0, StatusCode::OK);
    assert_eq!(call(&state, "/staff", Some(&professor)).await.0, StatusCode::OK);
    assert_eq!(call(&state, "/student", Some(&student)).await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let state = state();
    let foreign = in_memory_state(JwtConfig {
        access_secret: "someone-else".to_string(),
        refresh_secret: "someone-else-refresh".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 3600,
    });
    let token = token_for(&foreign, Role::SuperAdmin);

    let (status, body) = call(&state, "/admin", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Invalid or expired token"));
}
