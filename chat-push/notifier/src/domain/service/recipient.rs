//! 接收者解析

use std::collections::BTreeSet;

use crate::domain::model::{Chat, EarlyExit};

/// 接收者 = 会话参与者 - 发送者
pub fn resolve_recipients(chat: &Chat, sender_id: &str) -> Result<BTreeSet<String>, EarlyExit> {
    let recipients: BTreeSet<String> = chat
        .participant_ids
        .iter()
        .filter(|id| !id.is_empty() && id.as_str() != sender_id)
        .cloned()
        .collect();

    if recipients.is_empty() {
        return Err(EarlyExit::NoRecipients);
    }
    Ok(recipients)
}
