use std::sync::Arc;
use std::time::Duration;

use infralearn_config::AccountPolicy;
use infralearn_models::auth::SignUpRequest;
use infralearn_models::users::UpdateProfileDto;
use infralearn_models::{Identity, Role};
use infralearn_session::{MemoryBackend, Outcome, SessionError, SessionState, SessionStore};
use uuid::Uuid;

fn identity(username: &str, role: Role) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        username: username.to_string(),
        name: username.to_uppercase(),
        email: format!("{username}@infralearn.edu"),
        role,
    }
}

fn setup() -> (Arc<MemoryBackend>, SessionStore) {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_account(identity("ada", Role::Professor), "password123");
    backend.add_account(identity("grace", Role::Student), "password123");

    let store = SessionStore::new(backend.clone(), AccountPolicy::default());
    (backend, store)
}

fn sign_up(username: &str, email: &str, role: Role) -> SignUpRequest {
    SignUpRequest {
        username: username.to_string(),
        name: "New Person".to_string(),
        email: email.to_string(),
        password: "password123".to_string(),
        role,
    }
}

async fn wait_until(store: &SessionStore, predicate: impl FnMut(&SessionState) -> bool) {
    let mut rx = store.watch();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("state did not change in time")
        .expect("state channel closed");
}

#[tokio::test]
async fn starts_idle() {
    let (_, store) = setup();
    assert_eq!(store.state(), SessionState::Idle);
    assert!(store.identity().is_none());
}

#[tokio::test]
async fn sign_in_authenticates() {
    let (_, store) = setup();

    let identity = store.sign_in("ada", "password123").await.unwrap();

    assert_eq!(identity.username, "ada");
    assert_eq!(identity.role, Role::Professor);
    assert!(store.is_authenticated());
    assert_eq!(store.identity(), Some(identity));
}

#[tokio::test]
async fn wrong_password_leaves_store_idle() {
    let (_, store) = setup();

    let result = store.sign_in("ada", "wrong-password").await;

    assert_eq!(result, Err(SessionError::InvalidCredentials));
    assert_eq!(store.state(), SessionState::Idle);
}

#[tokio::test]
async fn empty_credentials_never_reach_backend() {
    let (backend, store) = setup();

    let result = store.sign_in("   ", "").await;

    assert!(matches!(result, Err(SessionError::Validation(_))));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn missing_profile_fails_sign_in() {
    let (backend, store) = setup();
    backend.drop_profile("grace");

    let result = store.sign_in("grace", "password123").await;

    assert_eq!(result, Err(SessionError::ProfileMissing));
    assert_eq!(store.state(), SessionState::Idle);
}

#[tokio::test]
async fn identity_load_failure_releases_backend_session() {
    let (backend, store) = setup();
    store.init().await;
    backend.fail_next_identity_load("timeout");

    let result = store.sign_in("ada", "password123").await;

    assert_eq!(result, Err(SessionError::Backend("timeout".to_string())));
    assert!(!backend.has_session());

    // Queued backend events must not resurrect the failed sign-in.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.state(), SessionState::Idle);
    store.teardown().await;
}

#[tokio::test]
async fn missing_profile_releases_backend_session() {
    let (backend, store) = setup();
    backend.drop_profile("grace");

    let _ = store.sign_in("grace", "password123").await;

    assert!(!backend.has_session());
}

#[tokio::test]
async fn sign_out_is_idempotent() {
    let (_, store) = setup();
    store.sign_in("ada", "password123").await.unwrap();

    store.sign_out().await;
    assert_eq!(store.state(), SessionState::Idle);

    store.sign_out().await;
    assert_eq!(store.state(), SessionState::Idle);
}

#[tokio::test]
async fn sign_out_clears_state_when_backend_fails() {
    let (backend, store) = setup();
    store.sign_in("ada", "password123").await.unwrap();
    backend.fail_sign_out(true);

    store.sign_out().await;

    assert_eq!(store.state(), SessionState::Idle);
}

#[tokio::test]
async fn student_sign_up_requires_institutional_email_before_any_backend_call() {
    let (backend, store) = setup();

    let result = store
        .sign_up(sign_up("newbie", "newbie@gmail.com", Role::Student))
        .await;

    assert_eq!(
        result,
        Err(SessionError::Validation(
            "Students must register with an @infralearn.edu email address".to_string()
        ))
    );
    assert_eq!(backend.call_count(), 0);
    assert!(!backend.has_account("newbie"));
}

#[tokio::test]
async fn super_admin_cannot_sign_up() {
    let (backend, store) = setup();

    let result = store
        .sign_up(sign_up("root", "root@infralearn.edu", Role::SuperAdmin))
        .await;

    assert!(matches!(result, Err(SessionError::Validation(_))));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn sign_up_creates_account_without_signing_in() {
    let (backend, store) = setup();

    let identity = store
        .sign_up(sign_up("newbie", "newbie@infralearn.edu", Role::Student))
        .await
        .unwrap();

    assert_eq!(identity.role, Role::Student);
    assert!(backend.has_account("newbie"));
    assert!(!store.is_authenticated());

    store.sign_in("newbie", "password123").await.unwrap();
    assert!(store.is_authenticated());
}

#[tokio::test]
async fn professors_may_sign_up_with_any_domain() {
    let (_, store) = setup();

    let identity = store
        .sign_up(sign_up("turing", "turing@example.com", Role::Professor))
        .await
        .unwrap();

    assert_eq!(identity.role, Role::Professor);
}

#[tokio::test]
async fn sign_up_rejects_taken_username() {
    let (_, store) = setup();

    let result = store
        .sign_up(sign_up("ada", "other@infralearn.edu", Role::Student))
        .await;

    assert_eq!(
        result,
        Err(SessionError::Validation("Username already taken".to_string()))
    );
}

#[tokio::test]
async fn init_restores_existing_session() {
    let (backend, store) = setup();
    assert!(backend.external_sign_in("grace"));

    store.init().await;

    assert_eq!(store.identity().map(|i| i.username), Some("grace".to_string()));
    store.teardown().await;
}

#[tokio::test]
async fn init_without_session_settles_idle() {
    let (_, store) = setup();

    let mut states = store.watch();
    store.init().await;

    assert_eq!(store.state(), SessionState::Idle);
    assert!(!states.borrow_and_update().is_loading());
    store.teardown().await;
}

#[tokio::test]
async fn follows_external_sign_in() {
    let (backend, store) = setup();
    store.init().await;

    backend.external_sign_in("ada");

    wait_until(&store, |state| state.is_authenticated()).await;
    assert_eq!(store.identity().map(|i| i.username), Some("ada".to_string()));
    store.teardown().await;
}

#[tokio::test]
async fn follows_session_expiry() {
    let (backend, store) = setup();
    store.init().await;
    store.sign_in("ada", "password123").await.unwrap();

    backend.expire_session();

    wait_until(&store, |state| *state == SessionState::Idle).await;
    store.teardown().await;
}

#[tokio::test]
async fn teardown_stops_following_events() {
    let (backend, store) = setup();
    store.init().await;
    store.teardown().await;

    backend.external_sign_in("ada");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(store.state(), SessionState::Idle);
}

#[tokio::test]
async fn teardown_waits_for_in_flight_sign_in() {
    let (backend, store) = setup();
    backend.set_sign_in_delay(Duration::from_millis(50));

    let (result, _) = tokio::join!(store.sign_in("ada", "password123"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.teardown().await;
    });

    assert!(result.is_ok());
    assert_eq!(store.state(), SessionState::Idle);
}

#[tokio::test]
async fn update_profile_requires_authentication() {
    let (_, store) = setup();

    let result = store
        .update_profile(UpdateProfileDto {
            name: Some("Ada Lovelace".to_string()),
            ..Default::default()
        })
        .await;

    assert_eq!(result, Err(SessionError::NotAuthenticated));
}

#[tokio::test]
async fn update_profile_mirrors_backend_result() {
    let (_, store) = setup();
    store.sign_in("ada", "password123").await.unwrap();

    let updated = store
        .update_profile(UpdateProfileDto {
            name: Some("Ada Lovelace".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(updated.name, "Ada Lovelace");
    assert_eq!(store.identity(), Some(updated));
}

#[tokio::test]
async fn update_profile_validates_input() {
    let (_, store) = setup();
    store.sign_in("ada", "password123").await.unwrap();

    let result = store
        .update_profile(UpdateProfileDto {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(SessionError::Validation(_))));
}

#[tokio::test]
async fn outcome_reports_errors() {
    let (_, store) = setup();

    let result = store.sign_in("ada", "nope-nope").await;
    let outcome = Outcome::from(&result);

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Invalid credentials"));
    assert_eq!(
        serde_json::to_value(Outcome::ok()).unwrap(),
        serde_json::json!({ "success": true })
    );
}
