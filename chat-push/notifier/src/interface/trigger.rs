//! 触发事件解码

use chat_push_core::error::{ErrorBuilder, ErrorCode, Result};

use crate::domain::model::TriggerEvent;

/// 解码一条 JSON 触发事件
///
/// 格式：`{"params": {"chatId": "..", "messageId": ".."}, "data": {..消息文档..}}`
pub fn decode_trigger(raw: &[u8]) -> Result<TriggerEvent> {
    serde_json::from_slice(raw).map_err(|err| {
        ErrorBuilder::new(ErrorCode::DeserializationError, "invalid trigger event")
            .details(err.to_string())
            .build_error()
    })
}
