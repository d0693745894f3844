use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::payments::HoldRequest;

/// Card processor holding goal stakes until the outcome is known.
#[async_trait]
#[automock]
pub trait PaymentGateway {
    /// Authorizes without capturing and returns the charge id.
    async fn hold(&self, request: HoldRequest) -> Result<String>;
    async fn refund(&self, charge_id: String, idempotency_key: String) -> Result<()>;
    async fn capture(&self, charge_id: String, idempotency_key: String) -> Result<()>;
}

#[async_trait]
#[automock]
pub trait PaypalGateway {
    /// Creates a CAPTURE-intent checkout order and returns its id.
    async fn create_order(&self, amount_minor: i64, currency: String) -> Result<String>;
}
