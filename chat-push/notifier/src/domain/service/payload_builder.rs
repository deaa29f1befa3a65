//! 通知负载构建（纯函数）

use crate::domain::model::{
    ContentKind, DeliveryHints, MessagePriority, NotificationMetadata, NotificationPayload,
};

/// 发送者名称缺失时的默认值
pub const DEFAULT_SENDER_NAME: &str = "Someone";
/// Android 通知渠道
pub const CHAT_CHANNEL_ID: &str = "chat_messages";
/// 客户端打开会话界面的动作
pub const OPEN_CHAT_ACTION: &str = "OPEN_CHAT_ACTIVITY";
pub const DEFAULT_SOUND: &str = "default";

pub fn notification_title(sender_display_name: Option<&str>) -> String {
    let name = sender_display_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_SENDER_NAME);
    format!("Message from {name}")
}

pub fn chat_delivery_hints() -> DeliveryHints {
    DeliveryHints {
        priority: MessagePriority::High,
        channel_id: CHAT_CHANNEL_ID.to_string(),
        click_action: OPEN_CHAT_ACTION.to_string(),
        sound: DEFAULT_SOUND.to_string(),
    }
}

pub fn build_payload(
    preview_text: String,
    sender_display_name: Option<&str>,
    content_kind: ContentKind,
    chat_id: &str,
    message_id: &str,
    sender_id: &str,
) -> NotificationPayload {
    NotificationPayload {
        title: notification_title(sender_display_name),
        body: preview_text,
        metadata: NotificationMetadata {
            chat_id: chat_id.to_string(),
            message_id: message_id.to_string(),
            sender_id: sender_id.to_string(),
        },
        hints: chat_delivery_hints(),
        content_kind,
    }
}
