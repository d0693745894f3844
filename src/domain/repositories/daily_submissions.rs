use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{
        daily_submissions::{
            DailySubmissionEntity, InsertDailySubmissionEntity, ReviewDailySubmissionEntity,
        },
        goals::GoalEntity,
        users::UserEntity,
    },
    value_objects::{enums::sort_order::SortOrder, submissions::SubmissionUpsert},
};

#[async_trait]
#[automock]
pub trait DailySubmissionRepository {
    /// One row per goal and day. A second write on the same day replaces the
    /// content of a still-pending row (keeping its file when none is given)
    /// and leaves a reviewed one untouched.
    async fn upsert_for_day(&self, submission: InsertDailySubmissionEntity)
    -> Result<SubmissionUpsert>;
    async fn find_by_id(&self, submission_id: Uuid) -> Result<Option<DailySubmissionEntity>>;
    async fn update_pending_content(
        &self,
        submission_id: Uuid,
        content: String,
        file_url: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<DailySubmissionEntity>>;
    async fn list_by_goal(
        &self,
        goal_id: Uuid,
        order: SortOrder,
    ) -> Result<Vec<DailySubmissionEntity>>;
    async fn list_by_goals(&self, goal_ids: Vec<Uuid>) -> Result<Vec<DailySubmissionEntity>>;
    async fn latest_submission_day(&self, goal_id: Uuid) -> Result<Option<NaiveDate>>;
    async fn list_pending_for_instructor(
        &self,
        instructor_id: Uuid,
    ) -> Result<Vec<(DailySubmissionEntity, GoalEntity, UserEntity)>>;
    /// Records a decision on a pending submission; `None` if it was already reviewed.
    async fn review(
        &self,
        submission_id: Uuid,
        review: ReviewDailySubmissionEntity,
    ) -> Result<Option<DailySubmissionEntity>>;
}
