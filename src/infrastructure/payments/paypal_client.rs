use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::domain::{
    repositories::payment_gateways::PaypalGateway,
    value_objects::payments::{GatewayError, format_minor_units},
};

const PROVIDER: &str = "paypal";

pub struct PaypalClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct TokenResp {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct OrderResp {
    id: String,
    status: Option<String>,
}

/// Order API errors carry `name`/`message`, the OAuth endpoint uses
/// `error`/`error_description`.
#[derive(Debug, Default, Deserialize)]
struct PaypalErrorBody {
    name: Option<String>,
    message: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody {
    intent: &'static str,
    purchase_units: Vec<PurchaseUnit>,
}

#[derive(Debug, Serialize)]
struct PurchaseUnit {
    amount: Amount,
}

#[derive(Debug, Serialize)]
struct Amount {
    currency_code: String,
    value: String,
}

impl PaypalClient {
    pub fn new(
        client_id: String,
        client_secret: String,
        api_base: String,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            client_id,
            client_secret,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let debug_id = resp
            .headers()
            .get("paypal-debug-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let body = resp.text().await.unwrap_or_default();

        let gateway_error = paypal_error(status.as_u16(), &body, context);
        error!(
            status = %status,
            paypal_debug_id = ?debug_id,
            paypal_error_code = ?gateway_error.code,
            response_body = %body,
            context = %context,
            "paypal api request failed"
        );

        Err(gateway_error.into())
    }

    async fn access_token(&self) -> Result<String> {
        let resp = self
            .http
            .post(format!("{}/v1/oauth2/token", self.api_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "fetch access token").await?;

        let token: TokenResp = resp.json().await?;
        Ok(token.access_token)
    }
}

fn paypal_error(status: u16, body: &str, context: &str) -> GatewayError {
    let parsed = serde_json::from_str::<PaypalErrorBody>(body).unwrap_or_default();
    GatewayError {
        provider: PROVIDER,
        context: context.to_string(),
        status,
        code: parsed.name.or(parsed.error),
        message: parsed
            .message
            .or(parsed.error_description)
            .unwrap_or_else(|| "paypal request failed".to_string()),
    }
}

fn order_body(amount_minor: i64, currency: &str) -> CreateOrderBody {
    CreateOrderBody {
        intent: "CAPTURE",
        purchase_units: vec![PurchaseUnit {
            amount: Amount {
                currency_code: currency.to_uppercase(),
                value: format_minor_units(amount_minor),
            },
        }],
    }
}

#[async_trait]
impl PaypalGateway for PaypalClient {
    async fn create_order(&self, amount_minor: i64, currency: String) -> Result<String> {
        let token = self.access_token().await?;

        let resp = self
            .http
            .post(format!("{}/v2/checkout/orders", self.api_base))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .json(&order_body(amount_minor, &currency))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create order").await?;

        let order: OrderResp = resp.json().await?;
        info!(order_id = %order.id, order_status = ?order.status, amount_minor, "paypal: order created");
        Ok(order.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_body_uses_decimal_amount() {
        let body = serde_json::to_value(order_body(1050, "usd")).unwrap();
        assert_eq!(body["intent"], "CAPTURE");
        assert_eq!(body["purchase_units"][0]["amount"]["currency_code"], "USD");
        assert_eq!(body["purchase_units"][0]["amount"]["value"], "10.50");
    }

    #[test]
    fn oauth_errors_are_understood() {
        let err = paypal_error(
            401,
            r#"{"error":"invalid_client","error_description":"Client Authentication failed"}"#,
            "fetch access token",
        );
        assert_eq!(err.code.as_deref(), Some("invalid_client"));
        assert_eq!(err.message, "Client Authentication failed");
    }
}
