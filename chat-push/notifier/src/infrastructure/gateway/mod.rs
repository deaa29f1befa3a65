pub mod fcm;
pub mod noop;

use std::sync::Arc;

use chat_push_core::config::PushGatewayConfig;
use chat_push_core::error::{ErrorBuilder, ErrorCode, Result};
use thiserror::Error;

use crate::domain::repository::PushGateway;

pub use fcm::FcmPushGateway;
pub use noop::NoopPushGateway;

pub type PushGatewayRef = Arc<dyn PushGateway>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("every request failed at transport level: {0}")]
    AllRequestsFailed(String),
    #[error("request rejected by gateway (http {status}): {message}")]
    Rejected { status: u16, message: String },
}

pub fn build_push_gateway(config: &PushGatewayConfig) -> Result<PushGatewayRef> {
    match config.provider.as_str() {
        "fcm" => Ok(Arc::new(FcmPushGateway::from_config(config)?)),
        "noop" => Ok(NoopPushGateway::shared()),
        other => Err(ErrorBuilder::new(
            ErrorCode::ConfigurationError,
            "unsupported push gateway provider",
        )
        .details(other.to_string())
        .build_error()),
    }
}
