use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::goal_statuses::GoalStatus,
    infrastructure::postgres::schema::goals,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = goals)]
pub struct GoalEntity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_days: i32,
    pub stake_amount_minor: i32,
    pub currency: String,
    pub start_date: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Owner's offset east of UTC when the goal was started.
    pub utc_offset_minutes: i32,
    pub status: String,
    pub user_id: Uuid,
    pub instructor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GoalEntity {
    pub fn goal_status(&self) -> anyhow::Result<GoalStatus> {
        GoalStatus::from_str(&self.status)
            .ok_or_else(|| anyhow::anyhow!("goal {} has unknown status {}", self.id, self.status))
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = goals)]
pub struct InsertGoalEntity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_days: i32,
    pub stake_amount_minor: i32,
    pub currency: String,
    pub start_date: DateTime<Utc>,
    pub status: String,
    pub user_id: Uuid,
}

/// Admin edit. `None` leaves a column alone; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = goals)]
pub struct AdminUpdateGoalEntity {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_days: Option<i32>,
    pub status: Option<String>,
    pub instructor_id: Option<Option<Uuid>>,
    pub started_at: Option<Option<DateTime<Utc>>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub updated_at: Option<DateTime<Utc>>,
}
