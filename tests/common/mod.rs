#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use infralearn::router::init_router;
use infralearn::state::{AppState, in_memory_state};
use infralearn_auth::Role;
use infralearn_config::{AccountPolicy, AdminSeedConfig, JwtConfig};
use infralearn_core::hash_password;
use infralearn_db::{Store, seed_admin};
use infralearn_models::Identity;
use infralearn_models::users::NewIdentity;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const PASSWORD: &str = "password123";
pub const DOMAIN: &str = "infralearn.edu";

const TEST_BCRYPT_COST: u32 = 4;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub async fn setup_test_app() -> TestApp {
    let state = in_memory_state(JwtConfig {
        access_secret: "test-access-secret".to_string(),
        refresh_secret: "test-refresh-secret".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    })
    .with_account_policy(AccountPolicy {
        institution_domain: DOMAIN.to_string(),
        bcrypt_cost: TEST_BCRYPT_COST,
    });

    seed_admin(
        state.store.as_ref(),
        &AdminSeedConfig {
            username: ADMIN_USERNAME.to_string(),
            email: format!("admin@{DOMAIN}"),
            name: "Administrator".to_string(),
            password: Some(ADMIN_PASSWORD.to_string()),
        },
        TEST_BCRYPT_COST,
    )
    .await
    .unwrap();

    TestApp {
        router: init_router(state.clone()),
        state,
    }
}

impl TestApp {
    /// Creates an account directly in the store, bypassing sign-up rules.
    pub async fn create_user(&self, username: &str, role: Role) -> Identity {
        self.state
            .store
            .register(NewIdentity {
                username: username.to_string(),
                name: format!("{username} Test"),
                email: format!("{username}@{DOMAIN}"),
                role,
                password_hash: hash_password(PASSWORD, TEST_BCRYPT_COST).unwrap(),
            })
            .await
            .unwrap()
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send("PATCH", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, Some(token), None).await
    }

    /// Full login response body.
    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({ "username": username, "password": password })),
        )
        .await
    }

    pub async fn token(&self, username: &str, password: &str) -> String {
        let (status, body) = self.login(username, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.token(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    /// Creates a user and returns it with an access token.
    pub async fn user_with_token(&self, username: &str, role: Role) -> (Identity, String) {
        let user = self.create_user(username, role).await;
        let token = self.token(username, PASSWORD).await;
        (user, token)
    }
}
