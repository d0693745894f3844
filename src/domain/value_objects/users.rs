use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::users::{EditUserEntity, InsertUserEntity, UserEntity},
    value_objects::{enums::roles::Role, iam::RequestContext},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserModel {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for UserModel {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            name: entity.name,
            role: Role::from_str(&entity.role).unwrap_or_default(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Owner details shown next to a goal in instructor listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryModel {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

impl From<UserEntity> for UserSummaryModel {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            name: entity.name,
        }
    }
}

/// Full replacement of the editable fields, as sent by `PUT /admin/users/:id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserModel {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
}

impl AdminUpdateUserModel {
    pub fn to_entity(&self) -> EditUserEntity {
        EditUserEntity {
            email: self.email.as_ref().map(|email| email.trim().to_string()),
            name: self.name.as_ref().map(|name| Some(name.trim().to_string())),
            role: self.role.map(|role| role.to_string()),
            updated_at: Some(Utc::now()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenameUserModel {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleChangeModel {
    pub message: String,
    pub role: Role,
}

/// Row seeded from token claims the first time a caller writes anything.
/// Tokens without an email cannot seed a row.
pub fn insert_entity_from_context(ctx: &RequestContext) -> Option<InsertUserEntity> {
    let email = ctx.email.as_deref()?.trim();
    if email.is_empty() {
        return None;
    }
    Some(InsertUserEntity {
        id: ctx.user_id,
        email: email.to_string(),
        name: ctx.name.clone(),
        role: ctx.role.to_string(),
    })
}
