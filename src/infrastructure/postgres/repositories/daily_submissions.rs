use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::{Connection, RunQueryDsl, dsl::max, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            daily_submissions::{
                DailySubmissionEntity, InsertDailySubmissionEntity, ReviewDailySubmissionEntity,
            },
            goals::GoalEntity,
            users::UserEntity,
        },
        repositories::daily_submissions::DailySubmissionRepository,
        value_objects::{
            enums::{sort_order::SortOrder, submission_statuses::SubmissionStatus},
            submissions::SubmissionUpsert,
        },
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{daily_submissions, goals, users},
    },
};

pub struct DailySubmissionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl DailySubmissionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl DailySubmissionRepository for DailySubmissionPostgres {
    async fn upsert_for_day(
        &self,
        submission: InsertDailySubmissionEntity,
    ) -> Result<SubmissionUpsert> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<SubmissionUpsert, diesel::result::Error, _>(|tx| {
            let inserted = insert_into(daily_submissions::table)
                .values(&submission)
                .on_conflict((daily_submissions::goal_id, daily_submissions::submission_day))
                .do_nothing()
                .returning(DailySubmissionEntity::as_returning())
                .get_result::<DailySubmissionEntity>(tx)
                .optional()?;
            if let Some(created) = inserted {
                return Ok(SubmissionUpsert::Created(created));
            }

            // Lock today's row so a concurrent writer waits for this update.
            let existing = daily_submissions::table
                .filter(daily_submissions::goal_id.eq(submission.goal_id))
                .filter(daily_submissions::submission_day.eq(submission.submission_day))
                .select(DailySubmissionEntity::as_select())
                .for_update()
                .first::<DailySubmissionEntity>(tx)?;

            if existing.status != SubmissionStatus::Pending.to_string() {
                return Ok(SubmissionUpsert::AlreadyReviewed(existing));
            }

            let file_url = submission.file_url.clone().or(existing.file_url);
            let updated = update(daily_submissions::table)
                .filter(daily_submissions::id.eq(existing.id))
                .set((
                    daily_submissions::content.eq(&submission.content),
                    daily_submissions::file_url.eq(file_url),
                    daily_submissions::submission_date.eq(submission.submission_date),
                    daily_submissions::updated_at.eq(submission.submission_date),
                ))
                .returning(DailySubmissionEntity::as_returning())
                .get_result::<DailySubmissionEntity>(tx)?;

            Ok(SubmissionUpsert::Updated(updated))
        })?;

        Ok(result)
    }

    async fn find_by_id(&self, submission_id: Uuid) -> Result<Option<DailySubmissionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = daily_submissions::table
            .filter(daily_submissions::id.eq(submission_id))
            .select(DailySubmissionEntity::as_select())
            .first::<DailySubmissionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn update_pending_content(
        &self,
        submission_id: Uuid,
        content: String,
        file_url: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<DailySubmissionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(daily_submissions::table)
            .filter(daily_submissions::id.eq(submission_id))
            .filter(daily_submissions::status.eq(SubmissionStatus::Pending.to_string()))
            .set((
                daily_submissions::content.eq(content),
                daily_submissions::file_url.eq(file_url),
                daily_submissions::updated_at.eq(updated_at),
            ))
            .returning(DailySubmissionEntity::as_returning())
            .get_result::<DailySubmissionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_by_goal(
        &self,
        goal_id: Uuid,
        order: SortOrder,
    ) -> Result<Vec<DailySubmissionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let mut query = daily_submissions::table
            .filter(daily_submissions::goal_id.eq(goal_id))
            .select(DailySubmissionEntity::as_select())
            .into_boxed();

        query = match order {
            SortOrder::Asc => query.order(daily_submissions::submission_date.asc()),
            SortOrder::Desc => query.order(daily_submissions::submission_date.desc()),
        };

        let results = query.load::<DailySubmissionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_by_goals(&self, goal_ids: Vec<Uuid>) -> Result<Vec<DailySubmissionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = daily_submissions::table
            .filter(daily_submissions::goal_id.eq_any(goal_ids))
            .order(daily_submissions::submission_date.desc())
            .select(DailySubmissionEntity::as_select())
            .load::<DailySubmissionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn latest_submission_day(&self, goal_id: Uuid) -> Result<Option<NaiveDate>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = daily_submissions::table
            .filter(daily_submissions::goal_id.eq(goal_id))
            .select(max(daily_submissions::submission_day))
            .first::<Option<NaiveDate>>(&mut conn)?;

        Ok(result)
    }

    async fn list_pending_for_instructor(
        &self,
        instructor_id: Uuid,
    ) -> Result<Vec<(DailySubmissionEntity, GoalEntity, UserEntity)>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = daily_submissions::table
            .inner_join(goals::table)
            .inner_join(users::table.on(goals::user_id.eq(users::id)))
            .filter(goals::instructor_id.eq(instructor_id))
            .filter(daily_submissions::status.eq(SubmissionStatus::Pending.to_string()))
            .order(daily_submissions::submission_date.asc())
            .select((
                DailySubmissionEntity::as_select(),
                GoalEntity::as_select(),
                UserEntity::as_select(),
            ))
            .load::<(DailySubmissionEntity, GoalEntity, UserEntity)>(&mut conn)?;

        Ok(results)
    }

    async fn review(
        &self,
        submission_id: Uuid,
        review: ReviewDailySubmissionEntity,
    ) -> Result<Option<DailySubmissionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(daily_submissions::table)
            .filter(daily_submissions::id.eq(submission_id))
            .filter(daily_submissions::status.eq(SubmissionStatus::Pending.to_string()))
            .set(&review)
            .returning(DailySubmissionEntity::as_returning())
            .get_result::<DailySubmissionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
