//! 新消息通知领域服务 - 串联整个处理流水线

use std::sync::Arc;
use std::time::Instant;

use chat_push_core::metrics::NotifierMetrics;
use chrono::Utc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use super::dispatcher::Dispatcher;
use super::payload_builder::build_payload;
use super::preview::{DEFAULT_PREVIEW_MAX_CHARS, PreviewResolver};
use super::recipient::resolve_recipients;
use super::reconciler::ResultReconciler;
use super::token_fetcher::TokenFetcher;
use crate::domain::model::{
    AddressBook, Chat, DeliveryReport, EarlyExit, HandlerState, InvocationOutcome,
    InvocationReport, Message, PipelineOutcome, PipelineStop, TriggerEvent,
};
use crate::domain::repository::{
    CipherKeySource, ContentCipher, DocumentStore, MAX_IDS_PER_QUERY, PushGateway,
};

/// 流水线策略（集合名、字段名与限制）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPolicy {
    pub chats_collection: String,
    pub users_collection: String,
    pub token_field: String,
    pub lookup_chunk_size: usize,
    pub preview_max_chars: usize,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            chats_collection: "chats".to_string(),
            users_collection: "users".to_string(),
            token_field: "fcmToken".to_string(),
            lookup_chunk_size: MAX_IDS_PER_QUERY,
            preview_max_chars: DEFAULT_PREVIEW_MAX_CHARS,
        }
    }
}

/// 调用内状态记录
struct StateTracker {
    transitions: Vec<HandlerState>,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            transitions: vec![HandlerState::Start],
        }
    }

    fn advance(&mut self, next: HandlerState) {
        debug!(from = %self.current(), to = %next, "Handler state transition");
        self.transitions.push(next);
    }

    fn current(&self) -> HandlerState {
        self.transitions.last().copied().unwrap_or(HandlerState::Start)
    }
}

/// 新消息通知领域服务
///
/// 每次调用独立执行，调用之间不共享任何可变状态。
pub struct NotificationDomainService {
    policy: NotificationPolicy,
    store: Arc<dyn DocumentStore>,
    key_source: Arc<dyn CipherKeySource>,
    preview_resolver: PreviewResolver,
    token_fetcher: TokenFetcher,
    dispatcher: Dispatcher,
    reconciler: ResultReconciler,
    metrics: Arc<NotifierMetrics>,
}

impl NotificationDomainService {
    pub fn new(
        policy: NotificationPolicy,
        store: Arc<dyn DocumentStore>,
        gateway: Arc<dyn PushGateway>,
        cipher: Arc<dyn ContentCipher>,
        key_source: Arc<dyn CipherKeySource>,
        metrics: Arc<NotifierMetrics>,
    ) -> Self {
        let preview_resolver = PreviewResolver::new(cipher, policy.preview_max_chars);
        let token_fetcher = TokenFetcher::new(
            Arc::clone(&store),
            policy.users_collection.clone(),
            policy.token_field.clone(),
            policy.lookup_chunk_size,
        );
        let reconciler = ResultReconciler::new(
            Arc::clone(&store),
            policy.users_collection.clone(),
            policy.token_field.clone(),
        );

        Self {
            policy,
            store,
            key_source,
            preview_resolver,
            token_fetcher,
            dispatcher: Dispatcher::new(gateway),
            reconciler,
            metrics,
        }
    }

    pub fn policy(&self) -> &NotificationPolicy {
        &self.policy
    }

    /// 处理一次新消息事件，总是以 DONE 结束
    ///
    /// 调用内的错误只记录并写入报告，不向调用方返回。
    #[instrument(
        skip(self, event),
        fields(chat_id = %event.params.chat_id, message_id = %event.params.message_id)
    )]
    pub async fn execute(&self, event: &TriggerEvent) -> InvocationReport {
        let invocation_id = Uuid::new_v4();
        let mut tracker = StateTracker::new();

        let outcome = match self.run_pipeline(event, &mut tracker).await {
            Ok(report) => InvocationOutcome::Completed(PipelineOutcome::Delivered(report)),
            Err(PipelineStop::EarlyExit(exit)) => {
                info!(state = %tracker.current(), reason = %exit, "Nothing to notify");
                InvocationOutcome::Completed(PipelineOutcome::Skipped(exit))
            }
            Err(PipelineStop::Failed(err)) => {
                error!(state = %tracker.current(), error = %err, "Notification pipeline failed");
                InvocationOutcome::Failed {
                    state: tracker.current(),
                    error: err.to_string(),
                }
            }
        };
        tracker.advance(HandlerState::Done);

        InvocationReport {
            invocation_id,
            chat_id: event.params.chat_id.clone(),
            message_id: event.params.message_id.clone(),
            transitions: tracker.transitions,
            outcome,
            finished_at_ms: Utc::now().timestamp_millis(),
        }
    }

    async fn run_pipeline(
        &self,
        event: &TriggerEvent,
        tracker: &mut StateTracker,
    ) -> Result<DeliveryReport, PipelineStop> {
        tracker.advance(HandlerState::ResolveRecipients);
        let message = Message::from_event(event)?;
        let chat = self.load_chat(&message.chat_id).await?;
        let recipients = resolve_recipients(&chat, &message.sender_id)?;
        debug!(recipients = recipients.len(), "Recipients resolved");

        tracker.advance(HandlerState::FetchTokens);
        let addresses = self.token_fetcher.fetch_tokens(&recipients).await?;
        let address_book = AddressBook::from_addresses(&addresses);

        tracker.advance(HandlerState::BuildPayload);
        let key = self.key_source.cipher_key();
        let preview =
            self.preview_resolver
                .resolve_preview(&message.content, message.content_kind, &key);
        let payload = build_payload(
            preview,
            message.sender_display_name.as_deref(),
            message.content_kind,
            &message.chat_id,
            &message.message_id,
            &message.sender_id,
        );

        tracker.advance(HandlerState::Dispatch);
        let started = Instant::now();
        let dispatched = self.dispatcher.dispatch(&payload, address_book.tokens()).await;
        self.metrics
            .dispatch_duration_seconds
            .observe(started.elapsed().as_secs_f64());
        let outcomes = dispatched?;

        let success_count = outcomes.iter().filter(|outcome| outcome.success).count();
        let failure_count = outcomes.len() - success_count;
        self.metrics
            .deliveries_total
            .with_label_values(&["success"])
            .inc_by(success_count as u64);
        self.metrics
            .deliveries_total
            .with_label_values(&["failure"])
            .inc_by(failure_count as u64);
        info!(
            attempted = outcomes.len(),
            success_count, failure_count, "Notifications dispatched"
        );

        tracker.advance(HandlerState::Reconcile);
        let reconciliation = self.reconciler.reconcile(&outcomes, &address_book).await;
        self.metrics
            .tokens_pruned_total
            .inc_by(reconciliation.pruned_users.len() as u64);
        info!(
            pruned = reconciliation.pruned_users.len(),
            failed_cleanups = reconciliation.failed_cleanups.len(),
            "Delivery results reconciled"
        );

        Ok(DeliveryReport {
            attempted: outcomes.len(),
            success_count,
            failure_count,
            reconciliation,
        })
    }

    async fn load_chat(&self, chat_id: &str) -> Result<Chat, PipelineStop> {
        match self
            .store
            .get_document(&self.policy.chats_collection, chat_id)
            .await?
        {
            Some(document) => Ok(Chat::from_document(&document)),
            None => Err(EarlyExit::ChatNotFound.into()),
        }
    }
}
