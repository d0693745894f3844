use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::{
    goals::{AdminUpdateGoalEntity, GoalEntity, InsertGoalEntity},
    payments::{InsertPaymentEntity, PaymentEntity},
    users::UserEntity,
};

#[async_trait]
#[automock]
pub trait GoalRepository {
    /// Inserts the goal and its held stake in one transaction.
    async fn create_with_stake(
        &self,
        goal: InsertGoalEntity,
        payment: InsertPaymentEntity,
    ) -> Result<(GoalEntity, PaymentEntity)>;
    async fn find_by_id(&self, goal_id: Uuid) -> Result<Option<GoalEntity>>;
    async fn find_with_owner(&self, goal_id: Uuid) -> Result<Option<(GoalEntity, UserEntity)>>;
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<GoalEntity>>;
    async fn list_pending_assignment(
        &self,
        excluding_user_id: Uuid,
    ) -> Result<Vec<(GoalEntity, UserEntity)>>;
    async fn list_assigned_to(&self, instructor_id: Uuid) -> Result<Vec<(GoalEntity, UserEntity)>>;
    /// Claims a goal that is still awaiting assignment. `None` when someone
    /// else got there first or the goal moved on.
    async fn assign_instructor(
        &self,
        goal_id: Uuid,
        instructor_id: Uuid,
    ) -> Result<Option<GoalEntity>>;
    async fn start(
        &self,
        goal_id: Uuid,
        owner_id: Uuid,
        started_at: DateTime<Utc>,
        end_date: DateTime<Utc>,
        utc_offset_minutes: i32,
    ) -> Result<Option<GoalEntity>>;
    /// Moves an ACTIVE goal to `goal_status` and its HELD payment to
    /// `payment_status` atomically. `None` if either row was not in the
    /// expected state; nothing is written in that case.
    async fn settle(
        &self,
        goal_id: Uuid,
        goal_status: String,
        payment_status: String,
    ) -> Result<Option<GoalEntity>>;
    async fn list_all(&self) -> Result<Vec<(GoalEntity, Option<PaymentEntity>)>>;
    async fn admin_update(
        &self,
        goal_id: Uuid,
        changes: AdminUpdateGoalEntity,
    ) -> Result<Option<GoalEntity>>;
    async fn delete(&self, goal_id: Uuid) -> Result<bool>;
    /// Goals the user owns or instructs.
    async fn count_involving_user(&self, user_id: Uuid) -> Result<i64>;
}
