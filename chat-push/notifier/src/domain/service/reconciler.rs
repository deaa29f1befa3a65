//! 投递结果对账：清理失效令牌

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, instrument, warn};

use super::mask_token;
use crate::domain::model::{AddressBook, DeliveryErrorKind, DeliveryOutcome, ReconcileSummary};
use crate::domain::repository::DocumentStore;

pub struct ResultReconciler {
    store: Arc<dyn DocumentStore>,
    users_collection: String,
    token_field: String,
}

impl ResultReconciler {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        users_collection: impl Into<String>,
        token_field: impl Into<String>,
    ) -> Self {
        Self {
            store,
            users_collection: users_collection.into(),
            token_field: token_field.into(),
        }
    }

    /// 只有 `TokenNotRegistered` 触发清理，其他失败仅记录
    ///
    /// 清理写入并发执行，单个写入失败不影响其他用户，也不会中断调用。
    #[instrument(skip_all, fields(outcomes = outcomes.len()))]
    pub async fn reconcile(
        &self,
        outcomes: &[DeliveryOutcome],
        address_book: &AddressBook,
    ) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let mut scheduled = HashSet::new();
        let mut handles = Vec::new();

        for outcome in outcomes.iter().filter(|outcome| !outcome.success) {
            let kind = outcome.error_kind.unwrap_or(DeliveryErrorKind::Other);
            warn!(
                token = %mask_token(&outcome.token),
                error_kind = kind.as_str(),
                error = outcome.error_message.as_deref().unwrap_or_default(),
                "Delivery to token failed"
            );

            if !outcome.is_unregistered() {
                summary.other_failures.push((outcome.token.clone(), kind));
                continue;
            }

            let owners = address_book.owners_of(&outcome.token);
            if owners.is_empty() {
                warn!(token = %mask_token(&outcome.token), "Unregistered token has no known owner");
                continue;
            }

            for user_id in owners {
                if !scheduled.insert(user_id.clone()) {
                    continue;
                }
                let store = Arc::clone(&self.store);
                let collection = self.users_collection.clone();
                let field = self.token_field.clone();
                let target = user_id.clone();
                handles.push((
                    user_id.clone(),
                    tokio::spawn(async move {
                        let cleared = Value::String(String::new());
                        store
                            .update_field(&collection, &target, &field, cleared)
                            .await
                    }),
                ));
            }
        }

        for (user_id, handle) in handles {
            match handle.await {
                Ok(Ok(())) => {
                    info!(user_id = %user_id, "Cleared unregistered token");
                    summary.pruned_users.push(user_id);
                }
                Ok(Err(e)) => {
                    error!(user_id = %user_id, error = %e, "Failed to clear unregistered token");
                    summary.failed_cleanups.push(user_id);
                }
                Err(e) => {
                    error!(user_id = %user_id, error = %e, "Token cleanup task join error");
                    summary.failed_cleanups.push(user_id);
                }
            }
        }

        summary
    }
}
