use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::submission_statuses::SubmissionStatus,
    infrastructure::postgres::schema::daily_submissions,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = daily_submissions)]
pub struct DailySubmissionEntity {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub submission_date: DateTime<Utc>,
    pub submission_day: NaiveDate,
    pub content: String,
    pub file_url: Option<String>,
    pub status: String,
    pub reviewer_id: Option<Uuid>,
    pub reviewer_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailySubmissionEntity {
    pub fn submission_status(&self) -> anyhow::Result<SubmissionStatus> {
        SubmissionStatus::from_str(&self.status).ok_or_else(|| {
            anyhow::anyhow!("submission {} has unknown status {}", self.id, self.status)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = daily_submissions)]
pub struct InsertDailySubmissionEntity {
    pub goal_id: Uuid,
    pub submission_date: DateTime<Utc>,
    pub submission_day: NaiveDate,
    pub content: String,
    pub file_url: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = daily_submissions)]
pub struct ReviewDailySubmissionEntity {
    pub status: String,
    pub reviewer_id: Option<Uuid>,
    pub reviewer_comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}
