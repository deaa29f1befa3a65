//! 解密密钥

use std::fmt;

/// 内容解密密钥，Debug 输出不暴露密钥内容
#[derive(Clone, PartialEq, Eq)]
pub struct CipherKey(Vec<u8>);

impl CipherKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for CipherKey {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CipherKey(<{} bytes>)", self.0.len())
    }
}

/// 解密失败原因
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecryptError {
    #[error("ciphertext is not valid base64")]
    InvalidBase64,
    #[error("ciphertext length {0} is not a positive multiple of the block size")]
    InvalidBlockLength(usize),
    #[error("unsupported key length {0}")]
    InvalidKeyLength(usize),
    #[error("padding validation failed")]
    InvalidPadding,
    #[error("plaintext is not valid utf-8")]
    InvalidUtf8,
}
