use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Non-2xx answer from a payment provider, carried inside `anyhow::Error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{provider} {context} failed with status {status}: {message}")]
pub struct GatewayError {
    pub provider: &'static str,
    pub context: String,
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
}

/// Authorization-only charge for a goal stake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldRequest {
    pub amount_minor: i32,
    pub currency: String,
    pub source_token: String,
    pub description: String,
    pub user_id: Uuid,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaypalOrderModel {
    /// Currency units, e.g. `10.50`.
    pub stake_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaypalOrderModel {
    pub id: String,
}

pub fn idempotency_key(goal_id: Uuid, action: &str) -> String {
    format!("goal-{goal_id}-{action}")
}

/// Converts a `stakeAmount` in currency units to minor units. Fractions of a
/// cent are rejected rather than rounded.
pub fn stake_minor_units(amount: Option<Decimal>) -> Result<i32, String> {
    let amount = amount.ok_or_else(|| "stakeAmount is required".to_string())?;
    if amount <= Decimal::ZERO {
        return Err("stakeAmount must be positive".to_string());
    }
    let minor = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| "stakeAmount is too large".to_string())?;
    if !minor.fract().is_zero() {
        return Err("stakeAmount cannot have more than two decimal places".to_string());
    }
    minor
        .to_i32()
        .ok_or_else(|| "stakeAmount is too large".to_string())
}

/// Renders minor units as a decimal string, e.g. `1050` -> `"10.50"`.
pub fn format_minor_units(amount_minor: i64) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
