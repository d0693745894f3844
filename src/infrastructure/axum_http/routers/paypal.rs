use std::sync::Arc;

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};

use crate::{
    application::usecases::paypal::PaypalUseCase,
    config::config_model::DotEnvyConfig,
    domain::{
        repositories::payment_gateways::PaypalGateway,
        value_objects::payments::CreatePaypalOrderModel,
    },
    infrastructure::{
        axum_http::{auth::AuthUser, extractors::ApiJson},
        payments::paypal_client::PaypalClient,
    },
};

pub fn routes(paypal: Arc<PaypalClient>, config: Arc<DotEnvyConfig>) -> Router {
    let usecase = PaypalUseCase::new(paypal, config.stripe.currency.clone());

    Router::new()
        .route("/create-order", post(create_order))
        .with_state(Arc::new(usecase))
}

pub async fn create_order<Pp>(
    State(usecase): State<Arc<PaypalUseCase<Pp>>>,
    auth: AuthUser,
    ApiJson(request): ApiJson<CreatePaypalOrderModel>,
) -> impl IntoResponse
where
    Pp: PaypalGateway + Send + Sync + 'static,
{
    match usecase.create_order(&auth.to_context(), request).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(err) => err.into_response(),
    }
}
