//! 投递结果

use serde::{Deserialize, Serialize};

/// 单个令牌的投递失败类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryErrorKind {
    /// 令牌已注销（客户端卸载或令牌轮换），永久失效
    TokenNotRegistered,
    /// 请求参数非法（令牌格式错误或负载非法）
    InvalidArgument,
    /// 配额超限
    QuotaExceeded,
    /// 网关暂时不可用
    Unavailable,
    Other,
}

impl DeliveryErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryErrorKind::TokenNotRegistered => "token_not_registered",
            DeliveryErrorKind::InvalidArgument => "invalid_argument",
            DeliveryErrorKind::QuotaExceeded => "quota_exceeded",
            DeliveryErrorKind::Unavailable => "unavailable",
            DeliveryErrorKind::Other => "other",
        }
    }
}

/// 网关对单个令牌的响应（与请求令牌顺序一致）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResponse {
    pub success: bool,
    pub error_kind: Option<DeliveryErrorKind>,
    pub error_message: Option<String>,
}

impl SendResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error_kind: None,
            error_message: None,
        }
    }

    pub fn failed(kind: DeliveryErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_kind: Some(kind),
            error_message: Some(message.into()),
        }
    }
}

/// 单个地址的投递结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub token: String,
    pub success: bool,
    pub error_kind: Option<DeliveryErrorKind>,
    pub error_message: Option<String>,
}

impl DeliveryOutcome {
    pub fn from_response(token: String, response: SendResponse) -> Self {
        Self {
            token,
            success: response.success,
            error_kind: response.error_kind,
            error_message: response.error_message,
        }
    }

    /// 是否应清理该令牌
    pub fn is_unregistered(&self) -> bool {
        !self.success && self.error_kind == Some(DeliveryErrorKind::TokenNotRegistered)
    }
}
