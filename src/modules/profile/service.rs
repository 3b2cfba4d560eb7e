use tracing::instrument;
use uuid::Uuid;

use infralearn_auth::Role;
use infralearn_config::AccountPolicy;
use infralearn_core::AppError;
use infralearn_db::Store;
use infralearn_models::Identity;
use infralearn_models::users::{IdentityChanges, UpdateProfileDto};
use infralearn_models::validation::is_valid_username;

pub struct ProfileService;

impl ProfileService {
    pub async fn get(store: &dyn Store, user_id: Uuid) -> Result<Identity, AppError> {
        store
            .find_identity(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Partial update of the caller's own identity. The role cannot be
    /// changed here, and students keep an institutional address.
    #[instrument(skip(store, policy, dto))]
    pub async fn update(
        store: &dyn Store,
        policy: &AccountPolicy,
        user_id: Uuid,
        dto: UpdateProfileDto,
    ) -> Result<Identity, AppError> {
        let changes = IdentityChanges::from(dto);
        if changes.is_empty() {
            return Err(AppError::bad_request("No changes provided"));
        }

        if let Some(username) = &changes.username
            && !is_valid_username(username)
        {
            return Err(AppError::bad_request(
                "Username may only contain letters, digits, '_', '.' and '-'",
            ));
        }

        let current = Self::get(store, user_id).await?;
        if let Some(email) = &changes.email
            && current.role == Role::Student
            && !policy.is_institutional(email)
        {
            return Err(AppError::bad_request(format!(
                "Students must use an @{} email address",
                policy.institution_domain
            )));
        }

        store
            .update_identity(user_id, &changes)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}
