//! Chat Push Core 配置模块
//!
//! 该模块提供了应用程序配置管理功能，包括：
//! - 配置文件加载和解析（单文件或配置目录）
//! - 环境特定配置覆盖
//! - 文档存储、推送网关等基础设施配置
//! - 通知服务配置定义

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use toml::Value;
use tracing::warn;

mod manager;
pub use manager::ConfigManager;

/// 全局应用配置实例，使用 OnceLock 确保只初始化一次
static APP_CONFIG: OnceLock<ChatPushAppConfig> = OnceLock::new();

/// 服务基础信息
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// 服务名称
    #[serde(default = "default_service_name")]
    pub name: String,
    /// 服务版本
    #[serde(default = "default_service_version")]
    pub version: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
        }
    }
}

fn default_service_name() -> String {
    "chat-push".to_string()
}

fn default_service_version() -> String {
    "0.1.0".to_string()
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（RUST_LOG 未设置时生效）
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub with_target: bool,
    #[serde(default)]
    pub with_thread_ids: bool,
    #[serde(default)]
    pub with_file: bool,
    #[serde(default)]
    pub with_line_number: bool,
    /// 以 JSON 格式输出（便于日志采集）
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: true,
            with_thread_ids: false,
            with_file: false,
            with_line_number: false,
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// 文档存储配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DocumentStoreConfig {
    /// 存储类型（firestore, memory）
    pub provider: String,
    /// 项目 ID
    #[serde(default)]
    pub project_id: Option<String>,
    /// 数据库名称，默认 "(default)"
    #[serde(default)]
    pub database: Option<String>,
    /// REST 端点
    #[serde(default)]
    pub endpoint: Option<String>,
    /// OAuth2 访问令牌
    #[serde(default)]
    pub access_token: Option<String>,
    /// 请求超时（毫秒）
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// 推送网关配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PushGatewayConfig {
    /// 网关类型（fcm, noop）
    pub provider: String,
    /// 项目 ID
    #[serde(default)]
    pub project_id: Option<String>,
    /// REST 端点
    #[serde(default)]
    pub endpoint: Option<String>,
    /// OAuth2 访问令牌
    #[serde(default)]
    pub access_token: Option<String>,
    /// 请求超时（毫秒），未设置时使用客户端默认值
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// 新消息通知服务配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotifierServiceConfig {
    /// 服务名称
    #[serde(default)]
    pub service_name: Option<String>,
    /// 文档存储配置名
    #[serde(default)]
    pub store: Option<String>,
    /// 推送网关配置名
    #[serde(default)]
    pub gateway: Option<String>,
    /// 消息内容解密密钥
    #[serde(default)]
    pub cipher_key: Option<String>,
    /// 会话集合名
    #[serde(default)]
    pub chats_collection: Option<String>,
    /// 用户集合名
    #[serde(default)]
    pub users_collection: Option<String>,
    /// 用户文档中的推送令牌字段
    #[serde(default)]
    pub token_field: Option<String>,
    /// 批量 "in" 查询的分片大小（上限 10）
    #[serde(default)]
    pub lookup_chunk_size: Option<usize>,
    /// 通知预览最大字符数
    #[serde(default)]
    pub preview_max_chars: Option<usize>,
}

/// 服务配置集合
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServicesConfig {
    /// 新消息通知服务配置
    #[serde(default)]
    pub notifier: Option<NotifierServiceConfig>,
}

/// Chat Push 应用配置主结构体
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChatPushAppConfig {
    /// 服务基础信息
    #[serde(default)]
    pub service: ServiceConfig,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 文档存储配置映射
    #[serde(default)]
    pub document_store: HashMap<String, DocumentStoreConfig>,
    /// 推送网关配置映射
    #[serde(default)]
    pub push_gateway: HashMap<String, PushGatewayConfig>,
    /// 服务配置
    #[serde(default)]
    pub services: ServicesConfig,
}

impl ChatPushAppConfig {
    /// 获取文档存储配置
    pub fn document_store_profile(&self, name: &str) -> Option<&DocumentStoreConfig> {
        self.document_store.get(name)
    }

    /// 获取推送网关配置
    pub fn push_gateway_profile(&self, name: &str) -> Option<&PushGatewayConfig> {
        self.push_gateway.get(name)
    }

    /// 获取新消息通知服务配置
    pub fn notifier_service(&self) -> NotifierServiceConfig {
        self.services.notifier.clone().unwrap_or_default()
    }

    /// 校验服务配置中引用的存储/网关配置是否存在
    pub fn validate_references(&self) -> Result<()> {
        let notifier = self.notifier_service();
        if let Some(name) = notifier.store.as_deref() {
            if self.document_store_profile(name).is_none() {
                return Err(anyhow!("notifier references unknown document_store `{name}`"));
            }
        }
        if let Some(name) = notifier.gateway.as_deref() {
            if self.push_gateway_profile(name).is_none() {
                return Err(anyhow!("notifier references unknown push_gateway `{name}`"));
            }
        }
        Ok(())
    }

    fn ensure_defaults(&mut self) {
        if self.service.name.is_empty() {
            self.service.name = default_service_name();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
    }
}

/// 加载配置
pub fn load_config(path: Option<&str>) -> &'static ChatPushAppConfig {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![PathBuf::from(p)],
        None => vec![PathBuf::from("config"), PathBuf::from("config.toml")],
    };

    APP_CONFIG.get_or_init(|| load_with_fallback(&candidates))
}

/// 获取应用配置（未加载时返回 None）
pub fn app_config() -> Option<&'static ChatPushAppConfig> {
    APP_CONFIG.get()
}

/// 使用备选方案加载配置
fn load_with_fallback(candidates: &[PathBuf]) -> ChatPushAppConfig {
    for path in candidates {
        match load_config_from_source(path) {
            Ok(cfg) => return cfg,
            Err(err) => {
                warn!("failed to load config from {}: {err:#}", path.display());
            }
        }
    }

    warn!("no configuration source succeeded, falling back to defaults");
    ChatPushAppConfig::default()
}

/// 从源加载配置（文件或目录），并合并环境特定配置
pub fn load_config_from_source(path: &Path) -> Result<ChatPushAppConfig> {
    if !path.exists() {
        return Err(anyhow!(
            "configuration path {} does not exist",
            path.display()
        ));
    }

    let metadata = path
        .metadata()
        .with_context(|| format!("unable to read metadata for {}", path.display()))?;

    let (mut merged, env_root) = if metadata.is_dir() {
        (load_directory_value(path)?, path.to_path_buf())
    } else {
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (load_toml_value(path)?, parent)
    };

    // 加载环境特定配置
    if let Err(e) = ConfigManager::load_environment_config(&mut merged, &env_root) {
        warn!("failed to load environment config: {e:#}");
    }

    let mut cfg: ChatPushAppConfig = merged
        .try_into()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    cfg.ensure_defaults();
    Ok(cfg)
}

/// 从目录加载配置：base.toml + shared/ + services/ + overrides/
fn load_directory_value(path: &Path) -> Result<Value> {
    let base_file = path.join("base.toml");
    if !base_file.exists() {
        return Err(anyhow!(
            "missing base configuration: {}",
            base_file.display()
        ));
    }

    let mut merged = load_toml_value(&base_file)?;

    if !merged.is_table() {
        return Err(anyhow!(
            "base configuration must be a table: {}",
            base_file.display()
        ));
    }

    merge_directory(&mut merged, &path.join("shared"))?;
    merge_directory(&mut merged, &path.join("services"))?;
    merge_directory(&mut merged, &path.join("overrides"))?;

    Ok(merged)
}

/// 合并目录中的配置（按文件名排序）
fn merge_directory(root: &mut Value, dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("unable to read config directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(OsStr::to_str)
                .map(|ext| ext.eq_ignore_ascii_case("toml"))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();

    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let value = load_toml_value(&entry.path())?;
        merge_value(root, value);
    }

    Ok(())
}

/// 加载 TOML 值
fn load_toml_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config fragment {}", path.display()))?;
    let value: Value = toml::from_str(&content)
        .with_context(|| format!("invalid TOML content in fragment {}", path.display()))?;
    Ok(value)
}

/// 合并值：表递归合并，其余类型以 overlay 为准
pub(crate) fn merge_value(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Table(overlay_table) => {
            if let Value::Table(base_table) = base {
                for (key, overlay_value) in overlay_table.into_iter() {
                    match base_table.get_mut(&key) {
                        Some(base_value) => merge_value(base_value, overlay_value),
                        None => {
                            base_table.insert(key, overlay_value);
                        }
                    }
                }
            } else {
                *base = Value::Table(overlay_table);
            }
        }
        other => {
            *base = other;
        }
    }
}
