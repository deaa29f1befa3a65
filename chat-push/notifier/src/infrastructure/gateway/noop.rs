use std::sync::Arc;

use async_trait::async_trait;
use chat_push_core::error::Result;
use tracing::info;

use crate::domain::model::{NotificationPayload, SendResponse};
use crate::domain::repository::PushGateway;

/// 不真正发送，所有令牌都视为成功
pub struct NoopPushGateway;

#[async_trait]
impl PushGateway for NoopPushGateway {
    fn name(&self) -> &str {
        "noop"
    }

    async fn send_multicast(
        &self,
        tokens: &[String],
        payload: &NotificationPayload,
    ) -> Result<Vec<SendResponse>> {
        info!(
            tokens = tokens.len(),
            chat_id = %payload.metadata.chat_id,
            title = %payload.title,
            "noop push gateway invoked"
        );
        Ok(tokens.iter().map(|_| SendResponse::ok()).collect())
    }
}

impl NoopPushGateway {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self)
    }
}
