use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::value_objects::{
    goal_lifecycle::InvalidTransition, iam::MissingCapability, payments::GatewayError,
};

#[derive(Debug, Error)]
pub enum UseCaseError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidState(String),
    #[error("instructors cannot take on their own goal")]
    SelfAssignment,
    #[error("payment failed: {message}")]
    Payment {
        message: String,
        gateway_status: Option<u16>,
    },
    #[error("{0}")]
    PaymentState(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl UseCaseError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UseCaseError::Unauthenticated => StatusCode::UNAUTHORIZED,
            UseCaseError::Forbidden(_) => StatusCode::FORBIDDEN,
            UseCaseError::Validation(_)
            | UseCaseError::InvalidState(_)
            | UseCaseError::SelfAssignment => StatusCode::BAD_REQUEST,
            UseCaseError::NotFound(_) => StatusCode::NOT_FOUND,
            UseCaseError::Payment { gateway_status, .. } => gateway_status
                .filter(|status| (400..500).contains(status))
                .and_then(|status| StatusCode::from_u16(status).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            UseCaseError::PaymentState(_) | UseCaseError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Gateway failures keep the provider's status so a declined card
    /// surfaces as 402 rather than a server error.
    pub fn from_gateway(err: anyhow::Error) -> Self {
        match err.downcast_ref::<GatewayError>() {
            Some(gateway_err) => UseCaseError::Payment {
                message: gateway_err.message.clone(),
                gateway_status: Some(gateway_err.status),
            },
            None => UseCaseError::Payment {
                message: "payment provider unavailable".to_string(),
                gateway_status: None,
            },
        }
    }
}

impl From<InvalidTransition> for UseCaseError {
    fn from(err: InvalidTransition) -> Self {
        UseCaseError::InvalidState(err.to_string())
    }
}

impl From<MissingCapability> for UseCaseError {
    fn from(err: MissingCapability) -> Self {
        UseCaseError::Forbidden(err.to_string())
    }
}

pub type UseCaseResult<T> = std::result::Result<T, UseCaseError>;
