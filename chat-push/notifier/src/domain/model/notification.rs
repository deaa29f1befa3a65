//! 通知负载（与具体推送网关无关）

use serde::{Deserialize, Serialize};

use super::message::ContentKind;

/// 投递优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagePriority {
    Normal,
    High,
}

/// 平台投递提示
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryHints {
    pub priority: MessagePriority,
    /// Android 通知渠道
    pub channel_id: String,
    /// 点击动作（Android clickAction / APNs category）
    pub click_action: String,
    pub sound: String,
}

/// 结构化元数据，客户端据此跳转到对应会话
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMetadata {
    pub chat_id: String,
    pub message_id: String,
    pub sender_id: String,
}

/// 通知负载，每次调用新建，不落库
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub metadata: NotificationMetadata,
    pub hints: DeliveryHints,
    pub content_kind: ContentKind,
}
