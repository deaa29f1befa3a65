//! 推送令牌批量查询

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, instrument};

use crate::domain::model::{EarlyExit, PipelineStop, RecipientAddress};
use crate::domain::repository::{DocumentStore, MAX_IDS_PER_QUERY};

/// 按固定大小切分 ID，块大小限制在 `1..=MAX_IDS_PER_QUERY`
///
/// 输入为有序集合，切分结果确定且不重复。
pub fn partition_ids(ids: &BTreeSet<String>, chunk_size: usize) -> Vec<Vec<String>> {
    let size = chunk_size.clamp(1, MAX_IDS_PER_QUERY);
    let ids: Vec<String> = ids.iter().cloned().collect();
    ids.chunks(size).map(<[String]>::to_vec).collect()
}

/// 令牌查询器
pub struct TokenFetcher {
    store: Arc<dyn DocumentStore>,
    users_collection: String,
    token_field: String,
    chunk_size: usize,
}

impl TokenFetcher {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        users_collection: impl Into<String>,
        token_field: impl Into<String>,
        chunk_size: usize,
    ) -> Self {
        Self {
            store,
            users_collection: users_collection.into(),
            token_field: token_field.into(),
            chunk_size,
        }
    }

    /// 并发查询所有分块，任一分块失败则整体失败
    ///
    /// 没有文档、令牌缺失或全为空白的用户被跳过；全部被跳过时提前结束。
    #[instrument(skip(self, user_ids), fields(recipients = user_ids.len()))]
    pub async fn fetch_tokens(
        &self,
        user_ids: &BTreeSet<String>,
    ) -> Result<Vec<RecipientAddress>, PipelineStop> {
        let chunks = partition_ids(user_ids, self.chunk_size);
        debug!(chunks = chunks.len(), "Querying recipient tokens");

        let queries = chunks
            .iter()
            .map(|chunk| self.store.query_by_ids_in(&self.users_collection, chunk));
        let results = try_join_all(queries).await?;

        let mut tokens: BTreeMap<String, String> = BTreeMap::new();
        for document in results.into_iter().flatten() {
            if !user_ids.contains(&document.id) {
                continue;
            }
            let address = document
                .str_field(&self.token_field)
                .and_then(|token| RecipientAddress::deliverable(document.id.as_str(), token));
            match address {
                Some(address) => {
                    tokens.insert(address.user_id, address.token);
                }
                None => debug!(user_id = %document.id, "Recipient has no deliverable token"),
            }
        }

        if tokens.is_empty() {
            return Err(EarlyExit::NoDeliverableRecipients.into());
        }

        Ok(tokens
            .into_iter()
            .map(|(user_id, token)| RecipientAddress { user_id, token })
            .collect())
    }
}
