use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    application::usecases::errors::{UseCaseError, UseCaseResult},
    domain::{
        entities::users::EditUserEntity,
        repositories::users::UserRepository,
        value_objects::{
            enums::roles::Role,
            iam::RequestContext,
            users::{RoleChangeModel, insert_entity_from_context},
        },
    },
};

pub struct UsersUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
}

impl<U> UsersUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    /// Students promote themselves; the new role applies to tokens issued
    /// after the change.
    pub async fn request_instructor(&self, ctx: &RequestContext) -> UseCaseResult<RoleChangeModel> {
        let user_id = ctx.user_id;

        if let Some(seed) = insert_entity_from_context(ctx) {
            self.user_repo.ensure_exists(seed).await.map_err(|err| {
                error!(%user_id, db_error = ?err, "users: failed to ensure user row");
                UseCaseError::Internal(err)
            })?;
        }

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "users: failed to load user");
                UseCaseError::Internal(err)
            })?
            .ok_or(UseCaseError::NotFound("user"))?;

        let current = Role::from_str(&user.role).unwrap_or_default();
        match current {
            Role::Instructor => Ok(RoleChangeModel {
                message: "already an instructor".to_string(),
                role: Role::Instructor,
            }),
            Role::Admin => {
                let err = UseCaseError::InvalidState(
                    "admins cannot change their own role".to_string(),
                );
                warn!(%user_id, status = err.status_code().as_u16(), "users: role request refused");
                Err(err)
            }
            Role::Student => {
                let changes = EditUserEntity {
                    role: Some(Role::Instructor.to_string()),
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                };
                self.user_repo
                    .update(user_id, changes)
                    .await
                    .map_err(|err| {
                        error!(%user_id, db_error = ?err, "users: failed to promote user");
                        UseCaseError::Internal(err)
                    })?
                    .ok_or(UseCaseError::NotFound("user"))?;

                info!(%user_id, "users: promoted to instructor");
                Ok(RoleChangeModel {
                    message: "role updated; sign in again to use it".to_string(),
                    role: Role::Instructor,
                })
            }
        }
    }
}
