//! 内存文档存储（本地运行与测试）

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chat_push_core::error::{ErrorCode, InfraResultExt, Result};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::StoreError;
use crate::domain::model::Document;
use crate::domain::repository::{DocumentStore, MAX_IDS_PER_QUERY};

/// 一次字段更新记录
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpdate {
    pub collection: String,
    pub id: String,
    pub field: String,
    pub value: Value,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, HashMap<String, Document>>,
    queries: Vec<Vec<String>>,
    updates: Vec<RecordedUpdate>,
}

/// 内存文档存储
///
/// 与真实存储一样拒绝超过 [`MAX_IDS_PER_QUERY`] 个 ID 的批量查询。
#[derive(Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<Inner>,
    fail_reads: bool,
    fail_queries: bool,
    fail_updates_for: HashSet<String>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, collection: &str, document: Document) -> Self {
        self.inner
            .get_mut()
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(document.id.clone(), document);
        self
    }

    /// 所有单文档读取都失败
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// 所有批量查询都失败
    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    /// 指定文档的更新失败
    pub fn failing_updates_for(mut self, id: &str) -> Self {
        self.fail_updates_for.insert(id.to_string());
        self
    }

    pub async fn insert(&self, collection: &str, document: Document) {
        self.inner
            .write()
            .await
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(document.id.clone(), document);
    }

    pub async fn field(&self, collection: &str, id: &str, field: &str) -> Option<Value> {
        let inner = self.inner.read().await;
        inner
            .collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .and_then(|document| document.get(field).cloned())
    }

    /// 已执行的批量查询（每次查询的 ID 列表）
    pub async fn query_log(&self) -> Vec<Vec<String>> {
        self.inner.read().await.queries.clone()
    }

    pub async fn update_log(&self) -> Vec<RecordedUpdate> {
        self.inner.read().await.updates.clone()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        if self.fail_reads {
            return Err(StoreError::Injected(format!("read {collection}/{id}")))
                .into_notify(ErrorCode::StoreUnavailable, "failed to read document");
        }

        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn query_by_ids_in(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>> {
        if ids.len() > MAX_IDS_PER_QUERY {
            return Err(StoreError::TooManyIds(ids.len()))
                .into_notify(ErrorCode::InvalidParameter, "query rejected");
        }
        if self.fail_queries {
            return Err(StoreError::Injected(format!("query {collection}")))
                .into_notify(ErrorCode::StoreUnavailable, "failed to query documents");
        }

        let mut inner = self.inner.write().await;
        inner.queries.push(ids.to_vec());
        let documents = inner
            .collections
            .get(collection)
            .map(|documents| {
                ids.iter()
                    .filter_map(|id| documents.get(id).cloned())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        debug!(collection, requested = ids.len(), found = documents.len(), "memory query");
        Ok(documents)
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<()> {
        if self.fail_updates_for.contains(id) {
            return Err(StoreError::Injected(format!("update {collection}/{id}")))
                .into_notify(ErrorCode::StoreUnavailable, "failed to update document");
        }

        let mut inner = self.inner.write().await;
        inner.updates.push(RecordedUpdate {
            collection: collection.to_string(),
            id: id.to_string(),
            field: field.to_string(),
            value: value.clone(),
        });
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_insert_with(|| Document::new(id))
            .fields
            .insert(field.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_oversized_query() {
        let store = InMemoryDocumentStore::new();
        let ids: Vec<String> = (0..11).map(|i| i.to_string()).collect();

        let err = store.query_by_ids_in("users", &ids).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameter);
        assert!(store.query_log().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_only_touches_named_field() {
        let store = InMemoryDocumentStore::new().with_document(
            "users",
            Document::new("bob")
                .with_field("fcmToken", "tok")
                .with_field("name", "Bob"),
        );

        store
            .update_field("users", "bob", "fcmToken", Value::from(""))
            .await
            .unwrap();

        assert_eq!(store.field("users", "bob", "fcmToken").await, Some(Value::from("")));
        assert_eq!(store.field("users", "bob", "name").await, Some(Value::from("Bob")));
    }

    #[tokio::test]
    async fn test_query_returns_only_existing_documents() {
        let store = InMemoryDocumentStore::new()
            .with_document("users", Document::new("a"))
            .with_document("users", Document::new("b"));

        let ids = vec!["a".to_string(), "z".to_string()];
        let documents = store.query_by_ids_in("users", &ids).await.unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, "a");
    }
}
