//! 通知预览文本解析

use std::sync::Arc;

use tracing::debug;

use crate::domain::model::{CipherKey, ContentKind};
use crate::domain::repository::ContentCipher;

/// 图片消息的固定预览
pub const IMAGE_PLACEHOLDER: &str = "📷 Image";
/// 截断标记
pub const TRUNCATION_MARKER: &str = "…";
/// 默认预览最大字符数
pub const DEFAULT_PREVIEW_MAX_CHARS: usize = 100;

/// 预览解析器：解密（可能被加密两次的）内容并截断
///
/// 解密失败只会降级为原始内容，不会中断流水线。
pub struct PreviewResolver {
    cipher: Arc<dyn ContentCipher>,
    max_chars: usize,
}

impl PreviewResolver {
    pub fn new(cipher: Arc<dyn ContentCipher>, max_chars: usize) -> Self {
        Self { cipher, max_chars }
    }

    pub fn resolve_preview(&self, content: &str, kind: ContentKind, key: &CipherKey) -> String {
        if kind == ContentKind::Image {
            return IMAGE_PLACEHOLDER.to_string();
        }

        let plaintext = self.decrypt_layers(content, key);
        truncate_preview(&plaintext, self.max_chars)
    }

    fn decrypt_layers(&self, content: &str, key: &CipherKey) -> String {
        let first = match self.cipher.decrypt(content, key) {
            Ok(first) => first,
            Err(err) => {
                debug!(error = %err, "content is not decryptable, using raw content");
                return content.to_string();
            }
        };

        // 历史数据中存在被加密两次的记录
        match self.cipher.decrypt(&first, key) {
            Ok(second) => {
                debug!("content was double encrypted");
                second
            }
            Err(_) => first,
        }
    }
}

/// 截断到 `max_chars` 个字符，被截断时追加截断标记
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{}", &text[..idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
