//! Chat Push Core 公共库
//!
//! 提供统一的配置加载、错误类型、日志初始化和指标收集功能

pub mod config;
pub mod error;
pub mod metrics;
pub mod tracing;

pub use config::{
    ChatPushAppConfig, ConfigManager, DocumentStoreConfig, LoggingConfig, NotifierServiceConfig,
    PushGatewayConfig, app_config, load_config,
};
pub use error::*;
