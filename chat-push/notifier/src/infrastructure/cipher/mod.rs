//! 内容解密

pub mod aes_ecb;
pub mod key_source;

pub use aes_ecb::{AesEcbCipher, KeyLengthError};
pub use key_source::{ConfiguredKeySource, INSECURE_FALLBACK_KEY};
