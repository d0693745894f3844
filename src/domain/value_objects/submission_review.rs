use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    entities::daily_submissions::ReviewDailySubmissionEntity,
    value_objects::enums::submission_statuses::SubmissionStatus,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject { comment: String },
}

impl ReviewDecision {
    /// Rejections must say why; an approval drops whatever comment came with it.
    pub fn parse(status: Option<&str>, comment: Option<&str>) -> Result<Self, String> {
        let status = status
            .map(str::trim)
            .and_then(SubmissionStatus::from_str)
            .ok_or_else(|| "status must be APPROVED or REJECTED".to_string())?;

        match status {
            SubmissionStatus::Approved => Ok(ReviewDecision::Approve),
            SubmissionStatus::Rejected => match comment.map(str::trim) {
                Some(comment) if !comment.is_empty() => Ok(ReviewDecision::Reject {
                    comment: comment.to_string(),
                }),
                _ => Err("reviewerComment is required when rejecting".to_string()),
            },
            SubmissionStatus::Pending => Err("status must be APPROVED or REJECTED".to_string()),
        }
    }

    pub fn status(&self) -> SubmissionStatus {
        match self {
            ReviewDecision::Approve => SubmissionStatus::Approved,
            ReviewDecision::Reject { .. } => SubmissionStatus::Rejected,
        }
    }

    pub fn to_entity(&self, reviewer_id: Uuid, now: DateTime<Utc>) -> ReviewDailySubmissionEntity {
        let reviewer_comment = match self {
            ReviewDecision::Approve => None,
            ReviewDecision::Reject { comment } => Some(comment.clone()),
        };
        ReviewDailySubmissionEntity {
            status: self.status().to_string(),
            reviewer_id: Some(reviewer_id),
            reviewer_comment,
            updated_at: now,
        }
    }
}
