//! 命令处理器（编排层）- 轻量级，只负责编排领域服务

use std::sync::Arc;

use chat_push_core::metrics::NotifierMetrics;
use tracing::{info, instrument};

use crate::application::commands::NotifyNewMessageCommand;
use crate::domain::model::InvocationReport;
use crate::domain::service::NotificationDomainService;

/// 通知命令处理器
pub struct NotificationCommandHandler {
    domain_service: Arc<NotificationDomainService>,
    metrics: Arc<NotifierMetrics>,
}

impl NotificationCommandHandler {
    pub fn new(
        domain_service: Arc<NotificationDomainService>,
        metrics: Arc<NotifierMetrics>,
    ) -> Self {
        Self {
            domain_service,
            metrics,
        }
    }

    #[instrument(
        skip(self, command),
        fields(
            chat_id = %command.event.params.chat_id,
            message_id = %command.event.params.message_id
        )
    )]
    pub async fn handle_new_message(&self, command: NotifyNewMessageCommand) -> InvocationReport {
        let report = self.domain_service.execute(&command.event).await;

        self.metrics
            .invocations_total
            .with_label_values(&[report.outcome_label()])
            .inc();
        info!(
            invocation_id = %report.invocation_id,
            outcome = report.outcome_label(),
            final_state = %report.final_state(),
            "Invocation finished"
        );
        report
    }
}
