//! 应用层命令定义

use crate::domain::model::TriggerEvent;

/// 新消息通知命令（每条新建消息一次）
#[derive(Debug, Clone)]
pub struct NotifyNewMessageCommand {
    pub event: TriggerEvent,
}

impl NotifyNewMessageCommand {
    pub fn new(event: TriggerEvent) -> Self {
        Self { event }
    }
}
