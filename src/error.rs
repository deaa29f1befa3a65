//! Chat Push Core 错误工具模块
//!
//! - 统一的错误码、错误类型和错误构建器
//! - 为基础设施层提供便捷的错误转换工具

use std::fmt;

use thiserror::Error;

/// 错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// 参数非法
    InvalidParameter,
    /// 配置错误
    ConfigurationError,
    /// 反序列化失败
    DeserializationError,
    /// 文档存储不可用（读写失败）
    StoreUnavailable,
    /// 推送网关调用整体失败
    DispatchFailed,
    /// 下游服务不可用
    ServiceUnavailable,
    /// 内部错误
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::DeserializationError => "DESERIALIZATION_ERROR",
            ErrorCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorCode::DispatchFailed => "DISPATCH_FAILED",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 统一业务错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("[{code}] {message}{}", render_details(.details))]
pub struct NotifyError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

fn render_details(details: &Option<String>) -> String {
    details
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl NotifyError {
    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

/// 业务层 Result
pub type Result<T> = std::result::Result<T, NotifyError>;

/// 错误构建器
#[derive(Debug)]
pub struct ErrorBuilder {
    code: ErrorCode,
    message: String,
    details: Option<String>,
}

impl ErrorBuilder {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// 附加错误细节（通常是底层错误的描述）
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn build_error(self) -> NotifyError {
        NotifyError {
            code: self.code,
            message: self.message,
            details: self.details,
        }
    }
}

/// 将基础设施错误映射为业务错误
pub fn map_infra_error<E: fmt::Display>(err: E, code: ErrorCode, message: &str) -> NotifyError {
    ErrorBuilder::new(code, message)
        .details(err.to_string())
        .build_error()
}

/// 基础设施层 Result 转换扩展
pub trait InfraResultExt<T> {
    fn into_notify(self, code: ErrorCode, message: &str) -> Result<T>;
}

impl<T, E: fmt::Display> InfraResultExt<T> for std::result::Result<T, E> {
    fn into_notify(self, code: ErrorCode, message: &str) -> Result<T> {
        self.map_err(|err| map_infra_error(err, code, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_with_details() {
        let err = ErrorBuilder::new(ErrorCode::StoreUnavailable, "chat lookup failed")
            .details("connection reset")
            .build_error();

        assert_eq!(
            err.to_string(),
            "[STORE_UNAVAILABLE] chat lookup failed: connection reset"
        );
        assert_eq!(err.code(), ErrorCode::StoreUnavailable);
    }

    #[test]
    fn test_error_display_without_details() {
        let err = ErrorBuilder::new(ErrorCode::DispatchFailed, "gateway rejected request")
            .build_error();
        assert_eq!(err.to_string(), "[DISPATCH_FAILED] gateway rejected request");
    }

    #[test]
    fn test_into_notify_maps_infra_error() {
        let raw: std::result::Result<(), String> = Err("timeout".to_string());
        let mapped = raw.into_notify(ErrorCode::ServiceUnavailable, "query failed");

        let err = mapped.unwrap_err();
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
        assert_eq!(err.details.as_deref(), Some("timeout"));
    }
}
