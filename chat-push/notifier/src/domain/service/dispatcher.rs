//! 多播投递

use std::sync::Arc;

use chat_push_core::error::{ErrorBuilder, ErrorCode, Result};
use tracing::{debug, instrument};

use crate::domain::model::{DeliveryOutcome, NotificationPayload};
use crate::domain::repository::PushGateway;

pub struct Dispatcher {
    gateway: Arc<dyn PushGateway>,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn PushGateway>) -> Self {
        Self { gateway }
    }

    /// 一次多播调用覆盖所有令牌，结果按令牌顺序一一对应
    #[instrument(
        skip(self, payload, tokens),
        fields(gateway = self.gateway.name(), tokens = tokens.len())
    )]
    pub async fn dispatch(
        &self,
        payload: &NotificationPayload,
        tokens: &[String],
    ) -> Result<Vec<DeliveryOutcome>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let responses = self
            .gateway
            .send_multicast(tokens, payload)
            .await
            .map_err(|err| {
                ErrorBuilder::new(ErrorCode::DispatchFailed, "multicast send failed")
                    .details(err.to_string())
                    .build_error()
            })?;

        if responses.len() != tokens.len() {
            return Err(ErrorBuilder::new(
                ErrorCode::DispatchFailed,
                "gateway response count does not match token count",
            )
            .details(format!(
                "expected {} responses, got {}",
                tokens.len(),
                responses.len()
            ))
            .build_error());
        }

        debug!("Multicast completed");
        Ok(tokens
            .iter()
            .cloned()
            .zip(responses)
            .map(|(token, response)| DeliveryOutcome::from_response(token, response))
            .collect())
    }
}
