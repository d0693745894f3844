use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::daily_submissions::DailySubmissionEntity,
    value_objects::{enums::submission_statuses::SubmissionStatus, users::UserSummaryModel},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionModel {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub submission_date: DateTime<Utc>,
    pub submission_day: NaiveDate,
    pub content: String,
    pub file_url: Option<String>,
    pub status: SubmissionStatus,
    pub reviewer_id: Option<Uuid>,
    pub reviewer_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DailySubmissionEntity> for SubmissionModel {
    fn from(entity: DailySubmissionEntity) -> Self {
        Self {
            id: entity.id,
            status: SubmissionStatus::from_str(&entity.status).unwrap_or_default(),
            goal_id: entity.goal_id,
            submission_date: entity.submission_date,
            submission_day: entity.submission_day,
            content: entity.content,
            file_url: entity.file_url,
            reviewer_id: entity.reviewer_id,
            reviewer_comment: entity.reviewer_comment,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Multipart body of `POST /submissions`, decoded by the router.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitDailyModel {
    pub goal_id: Uuid,
    pub content: String,
    pub file: Option<UploadedFile>,
    pub utc_offset_minutes: i32,
}

/// Multipart body of `PATCH /submissions/:id`.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSubmissionModel {
    pub content: String,
    pub file: Option<UploadedFile>,
}

/// What the day-keyed write did with the row for that day.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionUpsert {
    Created(DailySubmissionEntity),
    Updated(DailySubmissionEntity),
    AlreadyReviewed(DailySubmissionEntity),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub submission: SubmissionModel,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmissionModel {
    pub status: Option<String>,
    pub reviewer_comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingSubmissionGoalModel {
    pub id: Uuid,
    pub title: String,
    pub user: UserSummaryModel,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingSubmissionModel {
    #[serde(flatten)]
    pub submission: SubmissionModel,
    pub goal: PendingSubmissionGoalModel,
}
