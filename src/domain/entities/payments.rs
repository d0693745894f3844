use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::payment_statuses::PaymentStatus,
    infrastructure::postgres::schema::payments,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payments)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub provider: String,
    pub stripe_charge_id: String,
    pub amount_minor: i32,
    pub currency: String,
    pub status: String,
    pub type_: String,
    pub recipient_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentEntity {
    pub fn payment_status(&self) -> anyhow::Result<PaymentStatus> {
        PaymentStatus::from_str(&self.status).ok_or_else(|| {
            anyhow::anyhow!("payment {} has unknown status {}", self.id, self.status)
        })
    }
}

/// Stake row written in the same transaction as its goal.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payments)]
pub struct InsertPaymentEntity {
    pub goal_id: Uuid,
    pub provider: String,
    pub stripe_charge_id: String,
    pub amount_minor: i32,
    pub currency: String,
    pub status: String,
    pub type_: String,
    pub recipient_id: Uuid,
}
