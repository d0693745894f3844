use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{
    repositories::payment_gateways::PaymentGateway,
    value_objects::payments::{GatewayError, HoldRequest},
};

const PROVIDER: &str = "stripe";
const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

/// Minimal Stripe client built on reqwest, covering the charge calls a
/// goal stake goes through.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
    decline_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChargeResp {
    id: String,
    status: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: String, api_base: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            secret_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let gateway_error = stripe_error(status.as_u16(), &body, context);
        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_code = ?gateway_error.code,
            stripe_error_message = %gateway_error.message,
            response_body = %body,
            context = %context,
            "stripe api request failed"
        );

        Err(gateway_error.into())
    }

    async fn post_form(
        &self,
        path: &str,
        body: &[(&str, String)],
        idempotency_key: &str,
        context: &str,
    ) -> Result<ChargeResp> {
        let resp = self
            .http
            .post(format!("{}{}", self.api_base, path))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(IDEMPOTENCY_KEY, idempotency_key)
            .form(body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, context).await?;

        let parsed: ChargeResp = resp.json().await?;
        Ok(parsed)
    }
}

/// Builds the typed error from Stripe's `{ "error": { ... } }` envelope,
/// preferring the decline code for card failures.
fn stripe_error(status: u16, body: &str, context: &str) -> GatewayError {
    let (code, message) = match serde_json::from_str::<StripeErrorEnvelope>(body) {
        Ok(envelope) => {
            let details = envelope.error;
            let code = details.decline_code.or(details.code);
            let message = details
                .message
                .or_else(|| details.param.map(|param| format!("invalid parameter {param}")))
                .or(details.type_)
                .unwrap_or_else(|| "payment request failed".to_string());
            (code, message)
        }
        Err(_) => (None, "payment request failed".to_string()),
    };

    GatewayError {
        provider: PROVIDER,
        context: context.to_string(),
        status,
        code,
        message,
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn hold(&self, request: HoldRequest) -> Result<String> {
        // https://stripe.com/docs/api/charges/create with capture=false
        let body = [
            ("amount", request.amount_minor.to_string()),
            ("currency", request.currency.clone()),
            ("source", request.source_token.clone()),
            ("capture", "false".to_string()),
            ("description", request.description.clone()),
            ("metadata[user_id]", request.user_id.to_string()),
        ];

        let charge = self
            .post_form("/v1/charges", &body, &request.idempotency_key, "hold stake")
            .await?;

        info!(
            charge_id = %charge.id,
            charge_status = ?charge.status,
            user_id = %request.user_id,
            "stripe: stake held"
        );
        Ok(charge.id)
    }

    async fn refund(&self, charge_id: String, idempotency_key: String) -> Result<()> {
        // Refunding an uncaptured charge releases the authorization.
        let body = [("charge", charge_id.clone())];
        let refund = self
            .post_form("/v1/refunds", &body, &idempotency_key, "refund stake")
            .await?;

        info!(%charge_id, refund_id = %refund.id, "stripe: stake refunded");
        Ok(())
    }

    async fn capture(&self, charge_id: String, idempotency_key: String) -> Result<()> {
        let path = format!("/v1/charges/{charge_id}/capture");
        let charge = self
            .post_form(&path, &[], &idempotency_key, "capture stake")
            .await?;

        info!(%charge_id, charge_status = ?charge.status, "stripe: stake captured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_decline_keeps_status_and_decline_code() {
        let body = r#"{"error":{"type":"card_error","code":"card_declined","decline_code":"insufficient_funds","message":"Your card has insufficient funds."}}"#;
        let err = stripe_error(402, body, "hold stake");
        assert_eq!(err.status, 402);
        assert_eq!(err.code.as_deref(), Some("insufficient_funds"));
        assert_eq!(err.message, "Your card has insufficient funds.");
        assert_eq!(err.provider, "stripe");
    }

    #[test]
    fn unparseable_body_gets_generic_message() {
        let err = stripe_error(502, "<html>bad gateway</html>", "capture stake");
        assert_eq!(err.status, 502);
        assert_eq!(err.code, None);
        assert_eq!(err.message, "payment request failed");
    }
}
