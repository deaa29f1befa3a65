//! 领域服务

pub mod dispatcher;
pub mod notification_domain_service;
pub mod payload_builder;
pub mod preview;
pub mod recipient;
pub mod reconciler;
pub mod token_fetcher;

pub use dispatcher::Dispatcher;
pub use notification_domain_service::{NotificationDomainService, NotificationPolicy};
pub use payload_builder::build_payload;
pub use preview::{PreviewResolver, truncate_preview};
pub use recipient::resolve_recipients;
pub use reconciler::ResultReconciler;
pub use token_fetcher::{TokenFetcher, partition_ids};

/// 日志中只输出令牌前缀
pub(crate) fn mask_token(token: &str) -> String {
    match token.char_indices().nth(8) {
        Some((idx, _)) => format!("{}…", &token[..idx]),
        None => token.to_string(),
    }
}
