use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::{goals::GoalEntity, payments::PaymentEntity},
    value_objects::{
        due_dates::NextDue,
        enums::{goal_statuses::GoalStatus, payment_statuses::PaymentStatus},
        payments::stake_minor_units,
        submissions::SubmissionModel,
        users::UserSummaryModel,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalModel {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_days: i32,
    pub stake_amount: i32,
    pub currency: String,
    pub start_date: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub utc_offset_minutes: i32,
    pub status: GoalStatus,
    pub user_id: Uuid,
    pub instructor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GoalEntity> for GoalModel {
    fn from(entity: GoalEntity) -> Self {
        Self {
            id: entity.id,
            status: GoalStatus::from_str(&entity.status).unwrap_or_default(),
            title: entity.title,
            description: entity.description,
            duration_days: entity.duration_days,
            stake_amount: entity.stake_amount_minor,
            currency: entity.currency,
            start_date: entity.start_date,
            started_at: entity.started_at,
            end_date: entity.end_date,
            utc_offset_minutes: entity.utc_offset_minutes,
            user_id: entity.user_id,
            instructor_id: entity.instructor_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentModel {
    pub id: Uuid,
    pub provider: String,
    pub amount: i32,
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(rename = "type")]
    pub payment_type: String,
    pub recipient_id: Uuid,
}

impl From<PaymentEntity> for PaymentModel {
    fn from(entity: PaymentEntity) -> Self {
        Self {
            id: entity.id,
            status: PaymentStatus::from_str(&entity.status).unwrap_or_default(),
            provider: entity.provider,
            amount: entity.amount_minor,
            currency: entity.currency,
            payment_type: entity.type_,
            recipient_id: entity.recipient_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedGoalModel {
    #[serde(flatten)]
    pub goal: GoalModel,
    pub payment: PaymentModel,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalWithSubmissionsModel {
    #[serde(flatten)]
    pub goal: GoalModel,
    pub submissions: Vec<SubmissionModel>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalDetailModel {
    #[serde(flatten)]
    pub goal: GoalModel,
    pub submissions: Vec<SubmissionModel>,
    pub next_due_date: NextDue,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstructorGoalModel {
    #[serde(flatten)]
    pub goal: GoalModel,
    pub user: UserSummaryModel,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstructorGoalDetailModel {
    #[serde(flatten)]
    pub goal: GoalModel,
    pub user: UserSummaryModel,
    pub submissions: Vec<SubmissionModel>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminGoalModel {
    #[serde(flatten)]
    pub goal: GoalModel,
    pub payment: Option<PaymentModel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalModel {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_days: Option<i64>,
    /// Currency units, e.g. `10.50`.
    pub stake_amount: Option<Decimal>,
    #[serde(alias = "stripeToken")]
    pub payment_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedGoal {
    pub title: String,
    pub description: String,
    pub duration_days: i32,
    pub stake_amount_minor: i32,
    pub payment_token: String,
}

impl CreateGoalModel {
    pub fn validate(&self) -> Result<ValidatedGoal, String> {
        let title = required_text(self.title.as_deref(), "title")?;
        let description = required_text(self.description.as_deref(), "description")?;
        let payment_token = required_text(self.payment_token.as_deref(), "paymentToken")?;
        let duration_days = match self.duration_days {
            None => return Err("durationDays is required".to_string()),
            Some(days) => checked_duration_days(days)?,
        };
        let stake_amount_minor = stake_minor_units(self.stake_amount)?;

        Ok(ValidatedGoal {
            title,
            description,
            duration_days,
            stake_amount_minor,
            payment_token,
        })
    }
}

fn required_text(value: Option<&str>, field: &str) -> Result<String, String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(format!("{field} is required")),
    }
}

/// Ten years.
pub const MAX_DURATION_DAYS: i32 = 3650;

pub fn checked_duration_days(days: i64) -> Result<i32, String> {
    if days <= 0 {
        return Err("durationDays must be positive".to_string());
    }
    if days > i64::from(MAX_DURATION_DAYS) {
        return Err(format!("durationDays cannot exceed {MAX_DURATION_DAYS}"));
    }
    i32::try_from(days).map_err(|_| "durationDays is too large".to_string())
}

/// `None` when the end would fall outside the representable calendar.
pub fn end_date_after(started_at: DateTime<Utc>, duration_days: i32) -> Option<DateTime<Utc>> {
    Duration::try_days(i64::from(duration_days))
        .and_then(|duration| started_at.checked_add_signed(duration))
}

/// Query of `POST /goals/:id/start`; the offset defaults to UTC.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartGoalModel {
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignGoalModel {
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalizeGoalModel {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateGoalModel {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_days: Option<i64>,
    pub status: Option<GoalStatus>,
    pub instructor_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_request() -> CreateGoalModel {
        CreateGoalModel {
            title: Some("  Run every day ".to_string()),
            description: Some("5k minimum".to_string()),
            duration_days: Some(7),
            stake_amount: Some(Decimal::from(10)),
            payment_token: Some("tok_visa".to_string()),
        }
    }

    #[test]
    fn validate_trims_and_accepts_complete_request() {
        let validated = complete_request().validate().unwrap();
        assert_eq!(validated.title, "Run every day");
        assert_eq!(validated.duration_days, 7);
        assert_eq!(validated.stake_amount_minor, 1000);
    }

    #[test]
    fn validate_rejects_missing_or_non_positive_fields() {
        let mut request = complete_request();
        request.title = Some("   ".to_string());
        assert_eq!(request.validate().unwrap_err(), "title is required");

        let mut request = complete_request();
        request.stake_amount = Some(Decimal::ZERO);
        assert_eq!(request.validate().unwrap_err(), "stakeAmount must be positive");

        let mut request = complete_request();
        request.duration_days = None;
        assert_eq!(request.validate().unwrap_err(), "durationDays is required");

        let mut request = complete_request();
        request.payment_token = None;
        assert_eq!(request.validate().unwrap_err(), "paymentToken is required");
    }

    #[test]
    fn stripe_token_alias_is_accepted() {
        let request: CreateGoalModel = serde_json::from_str(
            r#"{"title":"t","description":"d","durationDays":3,"stakeAmount":5,"stripeToken":"tok_1"}"#,
        )
        .unwrap();
        assert_eq!(request.payment_token.as_deref(), Some("tok_1"));
        assert_eq!(request.validate().unwrap().stake_amount_minor, 500);
    }

    #[test]
    fn stake_amount_is_read_in_currency_units() {
        let request: CreateGoalModel = serde_json::from_str(
            r#"{"title":"t","description":"d","durationDays":3,"stakeAmount":5.5,"paymentToken":"tok_1"}"#,
        )
        .unwrap();
        assert_eq!(request.validate().unwrap().stake_amount_minor, 550);

        let mut request = complete_request();
        request.stake_amount = Some(Decimal::new(10_005, 3));
        assert_eq!(
            request.validate().unwrap_err(),
            "stakeAmount cannot have more than two decimal places"
        );
    }

    #[test]
    fn duration_is_capped() {
        let mut request = complete_request();
        request.duration_days = Some(i64::from(MAX_DURATION_DAYS));
        assert_eq!(request.validate().unwrap().duration_days, MAX_DURATION_DAYS);

        request.duration_days = Some(200_000_000);
        assert_eq!(
            request.validate().unwrap_err(),
            "durationDays cannot exceed 3650"
        );
        assert!(checked_duration_days(0).is_err());
    }

    #[test]
    fn end_date_overflow_is_none() {
        let started_at = Utc::now();
        assert_eq!(
            end_date_after(started_at, 7),
            Some(started_at + Duration::days(7))
        );
        assert_eq!(end_date_after(DateTime::<Utc>::MAX_UTC, 1), None);
    }
}
