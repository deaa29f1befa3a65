//! Firestore REST 文档存储

use std::time::Duration;

use async_trait::async_trait;
use chat_push_core::config::DocumentStoreConfig;
use chat_push_core::error::{ErrorBuilder, ErrorCode, InfraResultExt, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use super::StoreError;
use crate::domain::model::Document;
use crate::domain::repository::{DocumentStore, MAX_IDS_PER_QUERY};

const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_DATABASE: &str = "(default)";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Deserialize)]
struct RestDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<RestDocument>,
}

pub struct FirestoreDocumentStore {
    client: Client,
    endpoint: String,
    database_path: String,
    access_token: Option<String>,
}

impl FirestoreDocumentStore {
    pub fn from_config(config: &DocumentStoreConfig) -> Result<Self> {
        let project_id = config
            .project_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ErrorBuilder::new(
                    ErrorCode::ConfigurationError,
                    "firestore store requires project_id",
                )
                .build_error()
            })?;
        let database = config.database.as_deref().unwrap_or(DEFAULT_DATABASE);
        let timeout = Duration::from_millis(config.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));

        let client = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                ErrorBuilder::new(ErrorCode::ConfigurationError, "failed to build http client")
                    .details(err.to_string())
                    .build_error()
            })?;

        Ok(Self {
            client,
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
                .trim_end_matches('/')
                .to_string(),
            database_path: format!("projects/{project_id}/databases/{database}"),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{collection}/{id}", self.database_path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read_error(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StoreError::Status { status, body }
    }

    async fn fetch(
        &self,
        collection: &str,
        id: &str,
    ) -> std::result::Result<Option<Document>, StoreError> {
        let url = format!("{}/{}", self.endpoint, self.document_name(collection, id));
        let response = self.authorize(self.client.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        let document: RestDocument = response.json().await?;
        Ok(Some(into_document(document)))
    }

    async fn run_in_query(
        &self,
        collection: &str,
        ids: &[String],
    ) -> std::result::Result<Vec<Document>, StoreError> {
        if ids.len() > MAX_IDS_PER_QUERY {
            return Err(StoreError::TooManyIds(ids.len()));
        }
        let references: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "referenceValue": self.document_name(collection, id) }))
            .collect();
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "__name__" },
                        "op": "IN",
                        "value": { "arrayValue": { "values": references } }
                    }
                }
            }
        });

        let url = format!("{}/{}/documents:runQuery", self.endpoint, self.database_path);
        let response = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        let items: Vec<RunQueryItem> = response.json().await?;
        Ok(items
            .into_iter()
            .filter_map(|item| item.document)
            .map(into_document)
            .collect())
    }

    async fn patch_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> std::result::Result<(), StoreError> {
        let url = format!("{}/{}", self.endpoint, self.document_name(collection, id));
        let mut fields = Map::new();
        fields.insert(field.to_string(), encode_value(value));

        // 只更新指定字段，文档不存在时失败
        let response = self
            .authorize(self.client.patch(&url))
            .query(&[
                ("updateMask.fieldPaths", field),
                ("currentDocument.exists", "true"),
            ])
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    #[instrument(skip(self))]
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.fetch(collection, id)
            .await
            .into_notify(ErrorCode::StoreUnavailable, "failed to read document")
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn query_by_ids_in(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>> {
        let documents = self
            .run_in_query(collection, ids)
            .await
            .into_notify(ErrorCode::StoreUnavailable, "failed to query documents")?;
        debug!(found = documents.len(), "firestore in-query completed");
        Ok(documents)
    }

    #[instrument(skip(self, value))]
    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<()> {
        self.patch_field(collection, id, field, value)
            .await
            .into_notify(ErrorCode::StoreUnavailable, "failed to update document")
    }
}

fn into_document(document: RestDocument) -> Document {
    let id = document
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let fields = document
        .fields
        .into_iter()
        .map(|(name, value)| (name, decode_value(value)))
        .collect();
    Document { id, fields }
}

/// Firestore 类型化值 -> JSON
pub fn decode_value(value: Value) -> Value {
    let Value::Object(mut typed) = value else {
        return Value::Null;
    };
    let Some((kind, inner)) = typed.iter_mut().next().map(|(k, v)| (k.clone(), v.take())) else {
        return Value::Null;
    };

    match kind.as_str() {
        "integerValue" => inner
            .as_str()
            .and_then(|raw| raw.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or(inner),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().cloned().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(name, value)| (name.clone(), decode_value(value.clone())))
                        .collect()
                })
                .unwrap_or_default(),
        ),
        "nullValue" => Value::Null,
        _ => inner,
    }
}

/// JSON -> Firestore 类型化值
pub fn encode_value(value: Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => json!({ "integerValue": integer.to_string() }),
            None => json!({ "doubleValue": number }),
        },
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            let values: Vec<Value> = items.into_iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => {
            let fields: Map<String, Value> = fields
                .into_iter()
                .map(|(name, value)| (name, encode_value(value)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}
