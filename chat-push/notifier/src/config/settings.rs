//! 新消息通知服务配置

use std::env;

use chat_push_core::config::{ChatPushAppConfig, DocumentStoreConfig, PushGatewayConfig};

use crate::domain::repository::MAX_IDS_PER_QUERY;
use crate::domain::service::NotificationPolicy;
use crate::domain::service::preview::DEFAULT_PREVIEW_MAX_CHARS;

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub service_name: String,
    pub store: DocumentStoreConfig,
    pub gateway: PushGatewayConfig,
    /// 解密密钥（未配置时回退到内置密钥）
    pub cipher_key: Option<String>,
    pub chats_collection: String,
    pub users_collection: String,
    pub token_field: String,
    /// 已限制在 1..=10
    pub lookup_chunk_size: usize,
    pub preview_max_chars: usize,
}

impl NotifierConfig {
    pub fn from_app_config(app: &ChatPushAppConfig) -> Self {
        Self::from_sources(app, |name| env::var(name).ok())
    }

    /// 环境变量优先于配置文件
    pub fn from_sources(
        app: &ChatPushAppConfig,
        env_lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let service = app.notifier_service();

        let store_name = service.store.as_deref().unwrap_or("default");
        let mut store = app
            .document_store_profile(store_name)
            .cloned()
            .unwrap_or_else(|| DocumentStoreConfig {
                provider: "memory".to_string(),
                ..Default::default()
            });
        let gateway_name = service.gateway.as_deref().unwrap_or("default");
        let mut gateway = app
            .push_gateway_profile(gateway_name)
            .cloned()
            .unwrap_or_else(|| PushGatewayConfig {
                provider: "noop".to_string(),
                ..Default::default()
            });

        if let Some(provider) = env_lookup("CHAT_PUSH_STORE_PROVIDER") {
            store.provider = provider;
        }
        if let Some(provider) = env_lookup("CHAT_PUSH_GATEWAY_PROVIDER") {
            gateway.provider = provider;
        }
        if let Some(project_id) = env_lookup("CHAT_PUSH_PROJECT_ID") {
            store.project_id = Some(project_id.clone());
            gateway.project_id = Some(project_id);
        }
        if let Some(token) = env_lookup("CHAT_PUSH_ACCESS_TOKEN") {
            store.access_token = Some(token.clone());
            gateway.access_token = Some(token);
        }

        let cipher_key = env_lookup("CHAT_PUSH_CIPHER_KEY")
            .or_else(|| service.cipher_key.clone())
            .filter(|key| !key.is_empty());

        let lookup_chunk_size = env_lookup("CHAT_PUSH_LOOKUP_CHUNK_SIZE")
            .and_then(|raw| raw.parse::<usize>().ok())
            .or(service.lookup_chunk_size)
            .unwrap_or(MAX_IDS_PER_QUERY)
            .clamp(1, MAX_IDS_PER_QUERY);

        let preview_max_chars = env_lookup("CHAT_PUSH_PREVIEW_MAX_CHARS")
            .and_then(|raw| raw.parse::<usize>().ok())
            .or(service.preview_max_chars)
            .unwrap_or(DEFAULT_PREVIEW_MAX_CHARS);

        Self {
            service_name: service
                .service_name
                .clone()
                .unwrap_or_else(|| app.service.name.clone()),
            store,
            gateway,
            cipher_key,
            chats_collection: service
                .chats_collection
                .clone()
                .unwrap_or_else(|| "chats".to_string()),
            users_collection: service
                .users_collection
                .clone()
                .unwrap_or_else(|| "users".to_string()),
            token_field: service
                .token_field
                .clone()
                .unwrap_or_else(|| "fcmToken".to_string()),
            lookup_chunk_size,
            preview_max_chars,
        }
    }

    pub fn policy(&self) -> NotificationPolicy {
        NotificationPolicy {
            chats_collection: self.chats_collection.clone(),
            users_collection: self.users_collection.clone(),
            token_field: self.token_field.clone(),
            lookup_chunk_size: self.lookup_chunk_size,
            preview_max_chars: self.preview_max_chars,
        }
    }
}
