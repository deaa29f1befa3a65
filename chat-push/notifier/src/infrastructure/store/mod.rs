//! 文档存储实现

pub mod firestore;
pub mod memory;

use std::sync::Arc;

use chat_push_core::config::DocumentStoreConfig;
use chat_push_core::error::{ErrorBuilder, ErrorCode, Result};
use thiserror::Error;

use crate::domain::repository::DocumentStore;

pub use firestore::FirestoreDocumentStore;
pub use memory::{InMemoryDocumentStore, RecordedUpdate};

pub type DocumentStoreRef = Arc<dyn DocumentStore>;

/// 存储适配器内部错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("too many ids in one query: {0}")]
    TooManyIds(usize),
    #[error("injected failure: {0}")]
    Injected(String),
}

/// 按配置构建文档存储
pub fn build_document_store(config: &DocumentStoreConfig) -> Result<DocumentStoreRef> {
    match config.provider.as_str() {
        "firestore" => Ok(Arc::new(FirestoreDocumentStore::from_config(config)?)),
        "memory" => Ok(Arc::new(InMemoryDocumentStore::new())),
        other => Err(ErrorBuilder::new(
            ErrorCode::ConfigurationError,
            "unsupported document store provider",
        )
        .details(other.to_string())
        .build_error()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_is_rejected() {
        let config = DocumentStoreConfig {
            provider: "cassandra".to_string(),
            ..Default::default()
        };
        let err = build_document_store(&config).err().unwrap();
        assert_eq!(err.code, ErrorCode::ConfigurationError);
    }

    #[test]
    fn test_memory_provider() {
        let config = DocumentStoreConfig {
            provider: "memory".to_string(),
            ..Default::default()
        };
        assert!(build_document_store(&config).is_ok());
    }
}
