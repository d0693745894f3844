use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::payments::PaymentEntity;

#[async_trait]
#[automock]
pub trait PaymentRepository {
    async fn find_by_goal_id(&self, goal_id: Uuid) -> Result<Option<PaymentEntity>>;
}
