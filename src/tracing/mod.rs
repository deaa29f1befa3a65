//! # 日志初始化模块
//!
//! 为各个服务模块提供统一的 tracing 日志初始化能力。

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// 从配置初始化日志系统
///
/// # 参数
/// * `logging_config` - 日志配置（可选），如果为 None 则使用默认配置（info 级别）
///
/// # 示例
/// ```rust,ignore
/// use chat_push_core::config::LoggingConfig;
///
/// // 使用默认配置
/// init_tracing_from_config(None);
///
/// // 使用自定义配置
/// let config = LoggingConfig {
///     level: "debug".to_string(),
///     json: true,
///     ..Default::default()
/// };
/// init_tracing_from_config(Some(&config));
/// ```
pub fn init_tracing_from_config(logging_config: Option<&LoggingConfig>) {
    // 优先使用环境变量 RUST_LOG，如果没有则使用配置文件的日志级别
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let level_str = logging_config.map(|c| c.level.as_str()).unwrap_or("info");
            EnvFilter::new(level_str)
        }
    };

    let default_config = LoggingConfig::default();
    let config = logging_config.unwrap_or(&default_config);

    let builder = fmt::Subscriber::builder()
        .with_target(config.with_target)
        .with_thread_ids(config.with_thread_ids)
        .with_file(config.with_file)
        .with_line_number(config.with_line_number)
        .with_env_filter(env_filter);

    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
