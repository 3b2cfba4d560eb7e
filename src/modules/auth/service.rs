use tracing::{info, instrument};
use uuid::Uuid;

use infralearn_auth::{TokenCodec, auth_error};
use infralearn_config::AccountPolicy;
use infralearn_core::{AppError, hash_password, verify_password, verify_unknown_user};
use infralearn_db::Store;
use infralearn_models::Identity;
use infralearn_models::auth::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, SignUpRequest,
};
use infralearn_models::users::NewIdentity;

use crate::metrics::{
    track_jwt_issued, track_user_created, track_user_login_failure, track_user_login_success,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct AuthService;

impl AuthService {
    /// Checks the password against the stored hash and issues a token pair.
    /// Unknown usernames and wrong passwords are indistinguishable, both in
    /// the response and in the bcrypt work done.
    #[instrument(skip(store, tokens, policy, dto), fields(username = %dto.username))]
    pub async fn login(
        store: &dyn Store,
        tokens: &TokenCodec,
        policy: &AccountPolicy,
        dto: LoginRequest,
    ) -> Result<LoginResponse, AppError> {
        let Some(credentials) = store.find_credentials(dto.username.trim()).await? else {
            verify_unknown_user(&dto.password, policy.bcrypt_cost);
            track_user_login_failure("unknown_user");
            return Err(auth_error(INVALID_CREDENTIALS));
        };

        if !verify_password(&dto.password, &credentials.password_hash) {
            track_user_login_failure("wrong_password");
            return Err(auth_error(INVALID_CREDENTIALS));
        }

        let identity = credentials.identity;
        let token = tokens.issue_access(&identity.subject())?;
        track_jwt_issued("access");
        let refresh_token = tokens.issue_refresh(identity.id, credentials.token_version)?;
        track_jwt_issued("refresh");

        track_user_login_success(identity.role.as_str());
        info!(user_id = %identity.id, role = %identity.role, "User signed in");

        Ok(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            token,
            refresh_token,
            user: identity,
        })
    }

    /// Self-service sign-up. Role rules run before storage is touched, and
    /// the account is written in a single step.
    #[instrument(skip(store, policy, dto), fields(username = %dto.username, role = %dto.role))]
    pub async fn register(
        store: &dyn Store,
        policy: &AccountPolicy,
        dto: SignUpRequest,
    ) -> Result<Identity, AppError> {
        dto.check(policy).map_err(AppError::bad_request)?;

        if store.username_exists(&dto.username).await? {
            return Err(AppError::bad_request("Username already taken"));
        }

        let identity = store
            .register(NewIdentity {
                username: dto.username,
                name: dto.name,
                email: dto.email,
                role: dto.role,
                password_hash: hash_password(&dto.password, policy.bcrypt_cost)?,
            })
            .await?;

        track_user_created(identity.role.as_str());
        info!(user_id = %identity.id, "Account registered");
        Ok(identity)
    }

    pub async fn username_available(store: &dyn Store, username: &str) -> Result<bool, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::bad_request("username is required"));
        }
        Ok(!store.username_exists(username).await?)
    }

    /// Exchanges a refresh token for a new access token while the token's
    /// version still matches the account's.
    #[instrument(skip_all)]
    pub async fn refresh(
        store: &dyn Store,
        tokens: &TokenCodec,
        dto: RefreshRequest,
    ) -> Result<RefreshResponse, AppError> {
        let claims = tokens.verify_refresh(&dto.refresh_token)?;

        let credentials = store
            .find_credentials_by_id(claims.sub)
            .await?
            .ok_or_else(|| auth_error("Invalid or expired token"))?;

        if credentials.token_version != claims.token_version {
            return Err(auth_error("Refresh token has been revoked"));
        }

        let token = tokens.issue_access(&credentials.identity.subject())?;
        track_jwt_issued("access");

        Ok(RefreshResponse {
            success: true,
            token,
        })
    }

    /// Revokes every refresh token of the account. Access tokens already
    /// issued stay valid until they expire.
    #[instrument(skip(store))]
    pub async fn logout(store: &dyn Store, user_id: Uuid) -> Result<(), AppError> {
        store.bump_token_version(user_id).await?;
        info!(%user_id, "User signed out");
        Ok(())
    }

    pub async fn current_identity(store: &dyn Store, user_id: Uuid) -> Result<Identity, AppError> {
        store
            .find_identity(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}
