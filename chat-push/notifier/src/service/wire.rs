//! Wire 风格的依赖注入模块
//!
//! 按依赖顺序构建所有组件

use std::sync::Arc;

use anyhow::{Context, Result};
use chat_push_core::config::ChatPushAppConfig;
use chat_push_core::metrics::NotifierMetrics;
use tracing::{info, warn};

use crate::application::NotificationCommandHandler;
use crate::config::NotifierConfig;
use crate::domain::service::NotificationDomainService;
use crate::infrastructure::cipher::{AesEcbCipher, ConfiguredKeySource};
use crate::infrastructure::{build_document_store, build_push_gateway};
use crate::interface::StdinTriggerConsumer;

/// 应用上下文 - 包含所有已初始化的服务
pub struct ApplicationContext {
    pub config: Arc<NotifierConfig>,
    pub handler: Arc<NotificationCommandHandler>,
    pub consumer: Arc<StdinTriggerConsumer>,
}

/// 构建应用上下文
pub fn initialize(app_config: &ChatPushAppConfig) -> Result<ApplicationContext> {
    // 1. 加载服务配置
    let config = Arc::new(NotifierConfig::from_app_config(app_config));

    // 2. 基础设施
    let store = build_document_store(&config.store)
        .with_context(|| format!("failed to build document store `{}`", config.store.provider))?;
    let gateway = build_push_gateway(&config.gateway)
        .with_context(|| format!("failed to build push gateway `{}`", config.gateway.provider))?;

    // 3. 解密
    let key_source = ConfiguredKeySource::new(config.cipher_key.as_deref());
    if !key_source.is_configured() {
        warn!("CHAT_PUSH_CIPHER_KEY is not set, message previews use the built-in fallback key");
    }

    // 4. 指标
    let metrics = Arc::new(NotifierMetrics::new());

    // 5. 领域服务
    let domain_service = Arc::new(NotificationDomainService::new(
        config.policy(),
        store,
        gateway,
        Arc::new(AesEcbCipher::new()),
        Arc::new(key_source),
        metrics.clone(),
    ));

    // 6. 应用层与接口层
    let handler = Arc::new(NotificationCommandHandler::new(domain_service, metrics));
    let consumer = Arc::new(StdinTriggerConsumer::new(handler.clone()));

    info!(
        service = %config.service_name,
        store = %config.store.provider,
        gateway = %config.gateway.provider,
        "Notifier initialized"
    );

    Ok(ApplicationContext {
        config,
        handler,
        consumer,
    })
}
