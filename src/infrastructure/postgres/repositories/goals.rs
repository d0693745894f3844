use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{Connection, RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            goals::{AdminUpdateGoalEntity, GoalEntity, InsertGoalEntity},
            payments::{InsertPaymentEntity, PaymentEntity},
            users::UserEntity,
        },
        repositories::goals::GoalRepository,
        value_objects::enums::{goal_statuses::GoalStatus, payment_statuses::PaymentStatus},
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{goals, payments, users},
    },
};

pub struct GoalPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl GoalPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl GoalRepository for GoalPostgres {
    async fn create_with_stake(
        &self,
        goal: InsertGoalEntity,
        payment: InsertPaymentEntity,
    ) -> Result<(GoalEntity, PaymentEntity)> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<(GoalEntity, PaymentEntity), diesel::result::Error, _>(
            |tx| {
                let goal = insert_into(goals::table)
                    .values(&goal)
                    .returning(GoalEntity::as_returning())
                    .get_result::<GoalEntity>(tx)?;

                let payment = insert_into(payments::table)
                    .values(&payment)
                    .returning(PaymentEntity::as_returning())
                    .get_result::<PaymentEntity>(tx)?;

                Ok((goal, payment))
            },
        )?;

        Ok(result)
    }

    async fn find_by_id(&self, goal_id: Uuid) -> Result<Option<GoalEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = goals::table
            .filter(goals::id.eq(goal_id))
            .select(GoalEntity::as_select())
            .first::<GoalEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_with_owner(&self, goal_id: Uuid) -> Result<Option<(GoalEntity, UserEntity)>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = goals::table
            .inner_join(users::table.on(goals::user_id.eq(users::id)))
            .filter(goals::id.eq(goal_id))
            .select((GoalEntity::as_select(), UserEntity::as_select()))
            .first::<(GoalEntity, UserEntity)>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<GoalEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = goals::table
            .filter(goals::user_id.eq(user_id))
            .order(goals::created_at.desc())
            .select(GoalEntity::as_select())
            .load::<GoalEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_pending_assignment(
        &self,
        excluding_user_id: Uuid,
    ) -> Result<Vec<(GoalEntity, UserEntity)>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = goals::table
            .inner_join(users::table.on(goals::user_id.eq(users::id)))
            .filter(goals::status.eq(GoalStatus::PendingInstructorAssignment.to_string()))
            .filter(goals::user_id.ne(excluding_user_id))
            .order(goals::created_at.asc())
            .select((GoalEntity::as_select(), UserEntity::as_select()))
            .load::<(GoalEntity, UserEntity)>(&mut conn)?;

        Ok(results)
    }

    async fn list_assigned_to(&self, instructor_id: Uuid) -> Result<Vec<(GoalEntity, UserEntity)>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = goals::table
            .inner_join(users::table.on(goals::user_id.eq(users::id)))
            .filter(goals::instructor_id.eq(instructor_id))
            .filter(goals::status.eq_any(vec![
                GoalStatus::Assigned.to_string(),
                GoalStatus::Active.to_string(),
            ]))
            .order(goals::created_at.asc())
            .select((GoalEntity::as_select(), UserEntity::as_select()))
            .load::<(GoalEntity, UserEntity)>(&mut conn)?;

        Ok(results)
    }

    async fn assign_instructor(
        &self,
        goal_id: Uuid,
        instructor_id: Uuid,
    ) -> Result<Option<GoalEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(goals::table)
            .filter(goals::id.eq(goal_id))
            .filter(goals::status.eq(GoalStatus::PendingInstructorAssignment.to_string()))
            .filter(goals::user_id.ne(instructor_id))
            .set((
                goals::instructor_id.eq(Some(instructor_id)),
                goals::status.eq(GoalStatus::Assigned.to_string()),
                goals::updated_at.eq(Utc::now()),
            ))
            .returning(GoalEntity::as_returning())
            .get_result::<GoalEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn start(
        &self,
        goal_id: Uuid,
        owner_id: Uuid,
        started_at: DateTime<Utc>,
        end_date: DateTime<Utc>,
        utc_offset_minutes: i32,
    ) -> Result<Option<GoalEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(goals::table)
            .filter(goals::id.eq(goal_id))
            .filter(goals::user_id.eq(owner_id))
            .filter(goals::status.eq(GoalStatus::Assigned.to_string()))
            .set((
                goals::status.eq(GoalStatus::Active.to_string()),
                goals::started_at.eq(Some(started_at)),
                goals::end_date.eq(Some(end_date)),
                goals::utc_offset_minutes.eq(utc_offset_minutes),
                goals::updated_at.eq(started_at),
            ))
            .returning(GoalEntity::as_returning())
            .get_result::<GoalEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn settle(
        &self,
        goal_id: Uuid,
        goal_status: String,
        payment_status: String,
    ) -> Result<Option<GoalEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let result = conn.transaction::<GoalEntity, diesel::result::Error, _>(|tx| {
            let settled_payments = update(payments::table)
                .filter(payments::goal_id.eq(goal_id))
                .filter(payments::status.eq(PaymentStatus::Held.to_string()))
                .set((
                    payments::status.eq(&payment_status),
                    payments::updated_at.eq(now),
                ))
                .execute(tx)?;
            if settled_payments == 0 {
                return Err(diesel::result::Error::RollbackTransaction);
            }

            update(goals::table)
                .filter(goals::id.eq(goal_id))
                .filter(goals::status.eq(GoalStatus::Active.to_string()))
                .set((goals::status.eq(&goal_status), goals::updated_at.eq(now)))
                .returning(GoalEntity::as_returning())
                .get_result::<GoalEntity>(tx)
                .optional()?
                .ok_or(diesel::result::Error::RollbackTransaction)
        });

        match result {
            Ok(goal) => Ok(Some(goal)),
            Err(diesel::result::Error::RollbackTransaction) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_all(&self) -> Result<Vec<(GoalEntity, Option<PaymentEntity>)>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = goals::table
            .left_join(payments::table)
            .order(goals::created_at.desc())
            .select((GoalEntity::as_select(), Option::<PaymentEntity>::as_select()))
            .load::<(GoalEntity, Option<PaymentEntity>)>(&mut conn)?;

        Ok(results)
    }

    async fn admin_update(
        &self,
        goal_id: Uuid,
        changes: AdminUpdateGoalEntity,
    ) -> Result<Option<GoalEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(goals::table)
            .filter(goals::id.eq(goal_id))
            .set(&changes)
            .returning(GoalEntity::as_returning())
            .get_result::<GoalEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn delete(&self, goal_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = delete(goals::table)
            .filter(goals::id.eq(goal_id))
            .execute(&mut conn)?;

        Ok(deleted > 0)
    }

    async fn count_involving_user(&self, user_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = goals::table
            .filter(
                goals::user_id
                    .eq(user_id)
                    .or(goals::instructor_id.eq(user_id)),
            )
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }
}
