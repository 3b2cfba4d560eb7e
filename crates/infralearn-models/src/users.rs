use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use infralearn_auth::{Role, Subject};
use infralearn_core::OneOrMany;

/// A user's persisted profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn subject(&self) -> Subject {
        Subject {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Everything needed to persist a new account in one step.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
}

/// Partial update of an identity; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityChanges {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl IdentityChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.name.is_none() && self.email.is_none() && self.role.is_none()
    }

    pub fn apply(&self, identity: &mut Identity) {
        if let Some(username) = &self.username {
            identity.username = username.clone();
        }
        if let Some(name) = &self.name {
            identity.name = name.clone();
        }
        if let Some(email) = &self.email {
            identity.email = email.clone();
        }
        if let Some(role) = self.role {
            identity.role = role;
        }
    }
}

/// Account created by an administrator. Any role may be assigned.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 3, max = 32, message = "Username must be between 3 and 32 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 3, max = 32, message = "Username must be between 3 and 32 characters"))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

impl From<UpdateProfileDto> for IdentityChanges {
    fn from(dto: UpdateProfileDto) -> Self {
        IdentityChanges {
            username: dto.username,
            name: dto.name,
            email: dto.email,
            role: None,
        }
    }
}

/// Fields that can be applied to many users at once. Unique fields
/// (username, email) are not accepted.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BulkUserUpdates {
    pub name: Option<String>,
    pub role: Option<Role>,
}

impl From<BulkUserUpdates> for IdentityChanges {
    fn from(updates: BulkUserUpdates) -> Self {
        IdentityChanges {
            name: updates.name,
            role: updates.role,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateUsersDto {
    #[schema(value_type = Option<Vec<Uuid>>)]
    pub user_ids: Option<OneOrMany<Uuid>>,
    pub updates: Option<BulkUserUpdates>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteUsersDto {
    #[schema(value_type = Option<Vec<Uuid>>)]
    pub user_ids: Option<OneOrMany<Uuid>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkResult {
    pub affected: u64,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_update_accepts_single_id() {
        let id = Uuid::new_v4();
        let dto: BulkUpdateUsersDto = serde_json::from_value(serde_json::json!({
            "userIds": id,
            "updates": { "role": "professor" }
        }))
        .unwrap();

        assert_eq!(dto.user_ids.unwrap().into_vec(), vec![id]);
        let changes: IdentityChanges = dto.updates.unwrap().into();
        assert_eq!(changes.role, Some(Role::Professor));
        assert!(changes.username.is_none());
    }

    #[test]
    fn changes_apply_only_present_fields() {
        let mut identity = Identity {
            id: Uuid::new_v4(),
            username: "ada".to_string(),
            name: "Ada".to_string(),
            email: "ada@infralearn.edu".to_string(),
            role: Role::Student,
        };

        IdentityChanges {
            name: Some("Ada Lovelace".to_string()),
            ..Default::default()
        }
        .apply(&mut identity);

        assert_eq!(identity.name, "Ada Lovelace");
        assert_eq!(identity.username, "ada");
        assert_eq!(identity.role, Role::Student);
    }
}
