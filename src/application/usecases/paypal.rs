use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    application::usecases::errors::{UseCaseError, UseCaseResult},
    domain::{
        repositories::payment_gateways::PaypalGateway,
        value_objects::{
            iam::RequestContext,
            payments::{CreatePaypalOrderModel, PaypalOrderModel, stake_minor_units},
        },
    },
};

pub struct PaypalUseCase<Pp>
where
    Pp: PaypalGateway + Send + Sync + 'static,
{
    gateway: Arc<Pp>,
    currency: String,
}

impl<Pp> PaypalUseCase<Pp>
where
    Pp: PaypalGateway + Send + Sync + 'static,
{
    pub fn new(gateway: Arc<Pp>, currency: String) -> Self {
        Self { gateway, currency }
    }

    pub async fn create_order(
        &self,
        ctx: &RequestContext,
        request: CreatePaypalOrderModel,
    ) -> UseCaseResult<PaypalOrderModel> {
        let user_id = ctx.user_id;

        let amount_minor = stake_minor_units(request.stake_amount).map_err(|message| {
            let err = UseCaseError::Validation(message);
            warn!(%user_id, status = err.status_code().as_u16(), error = %err, "paypal: invalid order request");
            err
        })?;

        let order_id = self
            .gateway
            .create_order(i64::from(amount_minor), self.currency.clone())
            .await
            .map_err(|err| {
                let mapped = UseCaseError::from_gateway(err);
                warn!(
                    %user_id,
                    status = mapped.status_code().as_u16(),
                    error = %mapped,
                    "paypal: order creation failed"
                );
                mapped
            })?;

        info!(%user_id, %order_id, amount_minor, "paypal: order created");
        Ok(PaypalOrderModel { id: order_id })
    }
}
