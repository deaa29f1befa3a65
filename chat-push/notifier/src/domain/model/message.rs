//! 消息与触发事件

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::outcome::EarlyExit;

/// 消息内容类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentKind {
    Text,
    Image,
}

impl ContentKind {
    /// 客户端写入的 messageType 编码
    pub const TEXT_CODE: i64 = 0;
    pub const IMAGE_CODE: i64 = 1;

    /// 未知编码按文本处理
    pub fn from_code(code: i64) -> Self {
        if code == Self::IMAGE_CODE {
            ContentKind::Image
        } else {
            ContentKind::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "TEXT",
            ContentKind::Image => "IMAGE",
        }
    }
}

/// 触发事件携带的消息文档（字段名与存储文档保持一致）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDocument {
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sender_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_code")]
    pub message_type: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// 数字、布尔按文本处理；其他非字符串值视为缺失
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    })
}

/// 接受整数、浮点或数字字符串，无法识别时视为缺失
fn lenient_code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|code| code as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

/// 触发路径参数 `chats/{chatId}/messages/{messageId}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerParams {
    pub chat_id: String,
    pub message_id: String,
}

/// 新消息创建事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub params: TriggerParams,
    #[serde(default)]
    pub data: Option<MessageDocument>,
}

impl TriggerEvent {
    pub fn new(
        chat_id: impl Into<String>,
        message_id: impl Into<String>,
        data: MessageDocument,
    ) -> Self {
        Self {
            params: TriggerParams {
                chat_id: chat_id.into(),
                message_id: message_id.into(),
            },
            data: Some(data),
        }
    }
}

/// 领域消息（处理器只读，不做任何修改）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub chat_id: String,
    pub message_id: String,
    pub sender_id: String,
    pub sender_display_name: Option<String>,
    pub content: String,
    pub content_kind: ContentKind,
}

impl Message {
    /// 从触发事件构建消息；缺少发送者或会话 ID 时视为数据不足
    pub fn from_event(event: &TriggerEvent) -> Result<Self, EarlyExit> {
        let data = event.data.as_ref().ok_or(EarlyExit::InsufficientData)?;
        let sender_id = data
            .sender_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(EarlyExit::InsufficientData)?;
        if event.params.chat_id.is_empty() {
            return Err(EarlyExit::InsufficientData);
        }

        Ok(Self {
            chat_id: event.params.chat_id.clone(),
            message_id: event.params.message_id.clone(),
            sender_id: sender_id.to_string(),
            sender_display_name: data.sender_name.clone(),
            content: data.content.clone().unwrap_or_default(),
            content_kind: ContentKind::from_code(
                data.message_type.unwrap_or(ContentKind::TEXT_CODE),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_trigger_event_from_store_fields() {
        let raw = r#"{
            "params": {"chatId": "chat-1", "messageId": "msg-1"},
            "data": {"senderId": "alice", "senderName": "Alice", "content": "hi", "messageType": 1}
        }"#;
        let event: TriggerEvent = serde_json::from_str(raw).unwrap();
        let message = Message::from_event(&event).unwrap();

        assert_eq!(message.chat_id, "chat-1");
        assert_eq!(message.message_id, "msg-1");
        assert_eq!(message.sender_id, "alice");
        assert_eq!(message.sender_display_name.as_deref(), Some("Alice"));
        assert_eq!(message.content_kind, ContentKind::Image);
    }

    #[test]
    fn test_loosely_typed_fields_still_decode() {
        let raw = r#"{
            "params": {"chatId": "chat-1", "messageId": "msg-1"},
            "data": {"senderId": "alice", "senderName": 7, "content": 42, "messageType": "1"}
        }"#;
        let event: TriggerEvent = serde_json::from_str(raw).unwrap();
        let message = Message::from_event(&event).unwrap();

        assert_eq!(message.content, "42");
        assert_eq!(message.sender_display_name.as_deref(), Some("7"));
        assert_eq!(message.content_kind, ContentKind::Image);

        let raw = r#"{
            "params": {"chatId": "chat-1", "messageId": "msg-2"},
            "data": {"senderId": "alice", "content": {"nested": true}, "messageType": [1]}
        }"#;
        let event: TriggerEvent = serde_json::from_str(raw).unwrap();
        let message = Message::from_event(&event).unwrap();

        assert_eq!(message.content, "");
        assert_eq!(message.content_kind, ContentKind::Text);
    }

    #[test]
    fn test_missing_sender_is_insufficient_data() {
        let event = TriggerEvent::new("chat-1", "msg-1", MessageDocument::default());
        assert_eq!(Message::from_event(&event), Err(EarlyExit::InsufficientData));
    }

    #[test]
    fn test_missing_chat_id_is_insufficient_data() {
        let event = TriggerEvent::new(
            "",
            "msg-1",
            MessageDocument {
                sender_id: Some("alice".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(Message::from_event(&event), Err(EarlyExit::InsufficientData));
    }

    #[test]
    fn test_unknown_message_type_is_text() {
        assert_eq!(ContentKind::from_code(0), ContentKind::Text);
        assert_eq!(ContentKind::from_code(7), ContentKind::Text);
        assert_eq!(ContentKind::from_code(1), ContentKind::Image);
    }
}
