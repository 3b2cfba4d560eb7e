use tracing::{info, instrument};
use uuid::Uuid;

use infralearn_auth::Role;
use infralearn_config::AccountPolicy;
use infralearn_core::{AppError, OneOrMany, hash_password};
use infralearn_db::Store;
use infralearn_models::Identity;
use infralearn_models::users::{
    BulkDeleteUsersDto, BulkResult, BulkUpdateUsersDto, CreateUserDto, IdentityChanges,
    NewIdentity,
};
use infralearn_models::validation::is_valid_username;

use crate::metrics::{track_user_created, track_users_bulk};

pub struct UserService;

/// A present, non-empty id list or the standard 400.
fn required_ids(ids: Option<OneOrMany<Uuid>>) -> Result<Vec<Uuid>, AppError> {
    match ids.map(OneOrMany::into_vec) {
        Some(ids) if !ids.is_empty() => Ok(ids),
        _ => Err(AppError::bad_request("User IDs are required")),
    }
}

impl UserService {
    /// Administrator-created accounts may carry any role, including
    /// `super_admin`, and skip the institutional email rule.
    #[instrument(skip(store, policy, dto), fields(username = %dto.username, role = %dto.role))]
    pub async fn create_user(
        store: &dyn Store,
        policy: &AccountPolicy,
        dto: CreateUserDto,
    ) -> Result<Identity, AppError> {
        if !is_valid_username(&dto.username) {
            return Err(AppError::bad_request(
                "Username may only contain letters, digits, '_', '.' and '-'",
            ));
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
        info!(user_id = %identity.id, "User created by administrator");
        Ok(identity)
    }

    pub async fn list_users(
        store: &dyn Store,
        role: Option<Role>,
    ) -> Result<Vec<Identity>, AppError> {
        Ok(store.list_identities(role).await?)
    }

    pub async fn get_user(store: &dyn Store, id: Uuid) -> Result<Identity, AppError> {
        store
            .find_identity(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    #[instrument(skip(store))]
    pub async fn delete_user(store: &dyn Store, actor: Uuid, id: Uuid) -> Result<(), AppError> {
        if actor == id {
            return Err(AppError::bad_request("You cannot delete your own account"));
        }

        if store.delete_identities(&[id]).await? == 0 {
            return Err(AppError::not_found("User not found"));
        }

        info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Applies the same non-unique changes (name, role) to every listed
    /// user. Ids that do not exist are skipped.
    #[instrument(skip(store, dto))]
    pub async fn bulk_update(
        store: &dyn Store,
        dto: BulkUpdateUsersDto,
    ) -> Result<BulkResult, AppError> {
        let ids = required_ids(dto.user_ids)?;

        let changes = dto
            .updates
            .map(IdentityChanges::from)
            .filter(|changes| !changes.is_empty())
            .ok_or_else(|| AppError::bad_request("Updates are required"))?;

        if let Some(name) = &changes.name
            && name.trim().is_empty()
        {
            return Err(AppError::bad_request("Name cannot be empty"));
        }

        let affected = store.update_identities(&ids, &changes).await?;
        track_users_bulk("update", affected);
        info!(requested = ids.len(), affected, "Bulk user update");

        Ok(BulkResult { affected })
    }

    #[instrument(skip(store, dto))]
    pub async fn bulk_delete(
        store: &dyn Store,
        actor: Uuid,
        dto: BulkDeleteUsersDto,
    ) -> Result<BulkResult, AppError> {
        let ids = required_ids(dto.user_ids)?;

        if ids.contains(&actor) {
            return Err(AppError::bad_request("You cannot delete your own account"));
        }

        let affected = store.delete_identities(&ids).await?;
        track_users_bulk("delete", affected);
        info!(requested = ids.len(), affected, "Bulk user delete");

        Ok(BulkResult { affected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_ids_rejects_missing_and_empty() {
        assert!(required_ids(None).is_err());
        assert!(required_ids(Some(OneOrMany::Many(vec![]))).is_err());

        let id = Uuid::new_v4();
        assert_eq!(required_ids(Some(OneOrMany::One(id))).unwrap(), vec![id]);
    }
}
