//! 会话与接收地址

use std::collections::{HashMap, HashSet};

use super::document::Document;

/// 会话文档中的参与者字段
pub const PARTICIPANT_IDS_FIELD: &str = "participantIds";

/// 会话（处理器只读）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub chat_id: String,
    pub participant_ids: Vec<String>,
}

impl Chat {
    pub fn new(chat_id: impl Into<String>, participant_ids: Vec<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            participant_ids,
        }
    }

    pub fn from_document(document: &Document) -> Self {
        Self {
            chat_id: document.id.clone(),
            participant_ids: document.string_list(PARTICIPANT_IDS_FIELD),
        }
    }
}

/// 接收地址：用户与其当前推送令牌
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecipientAddress {
    pub user_id: String,
    pub token: String,
}

impl RecipientAddress {
    /// 空白令牌不可投递，返回 None
    pub fn deliverable(user_id: impl Into<String>, token: &str) -> Option<Self> {
        if token.trim().is_empty() {
            return None;
        }
        Some(Self {
            user_id: user_id.into(),
            token: token.to_string(),
        })
    }
}

/// 投递地址簿：去重后的令牌列表 + 令牌归属
///
/// 多个用户共享同一令牌时只投递一次，令牌失效时所有归属用户都会被清理。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBook {
    tokens: Vec<String>,
    owners: HashMap<String, Vec<String>>,
}

impl AddressBook {
    pub fn from_addresses(addresses: &[RecipientAddress]) -> Self {
        let mut book = Self::default();
        let mut seen = HashSet::new();
        for address in addresses {
            if seen.insert(address.token.clone()) {
                book.tokens.push(address.token.clone());
            }
            book.owners
                .entry(address.token.clone())
                .or_default()
                .push(address.user_id.clone());
        }
        book
    }

    /// 按首次出现顺序排列的唯一令牌
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn owners_of(&self, token: &str) -> &[String] {
        self.owners.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn owners(&self) -> &HashMap<String, Vec<String>> {
        &self.owners
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}
