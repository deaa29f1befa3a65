//! 仓储接口（Port）

use async_trait::async_trait;
use chat_push_core::error::Result;
use serde_json::Value;

use crate::domain::model::{CipherKey, DecryptError, Document, NotificationPayload, SendResponse};

/// 单次 "key in set" 查询允许的最大 ID 数
pub const MAX_IDS_PER_QUERY: usize = 10;

/// 文档存储（Repository）
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 按 ID 读取文档，不存在时返回 None
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// 批量按 ID 查询，`ids` 不超过 [`MAX_IDS_PER_QUERY`]
    async fn query_by_ids_in(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>>;

    /// 更新单个字段
    async fn update_field(&self, collection: &str, id: &str, field: &str, value: Value)
    -> Result<()>;
}

/// 推送网关（Repository）
#[async_trait]
pub trait PushGateway: Send + Sync {
    fn name(&self) -> &str;

    /// 多播发送：一次调用覆盖所有令牌，按令牌顺序返回每个令牌的结果
    async fn send_multicast(
        &self,
        tokens: &[String],
        payload: &NotificationPayload,
    ) -> Result<Vec<SendResponse>>;
}

/// 对称解密原语
pub trait ContentCipher: Send + Sync {
    fn decrypt(
        &self,
        ciphertext_base64: &str,
        key: &CipherKey,
    ) -> std::result::Result<String, DecryptError>;
}

/// 解密密钥来源，每次调用取一次
pub trait CipherKeySource: Send + Sync {
    fn cipher_key(&self) -> CipherKey;
}
