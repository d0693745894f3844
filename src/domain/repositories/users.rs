use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::users::{EditUserEntity, InsertUserEntity, UserEntity};

#[async_trait]
#[automock]
pub trait UserRepository {
    /// Inserts the row unless one with the same id exists already.
    async fn ensure_exists(&self, user: InsertUserEntity) -> Result<()>;
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>>;
    async fn list_all(&self) -> Result<Vec<UserEntity>>;
    async fn update(&self, user_id: Uuid, changes: EditUserEntity) -> Result<Option<UserEntity>>;
    async fn delete(&self, user_id: Uuid) -> Result<bool>;
}
