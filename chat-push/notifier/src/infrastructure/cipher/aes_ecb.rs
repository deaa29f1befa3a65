//! AES/ECB/PKCS#7 内容解密
//!
//! 客户端历史数据使用固定密钥、ECB 模式、无 IV 加密后以 Base64 存储。
//! ECB 是已知的弱模式，这里仅为兼容存量密文而逐字节复现，不可用于新数据。

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use crate::domain::model::{CipherKey, DecryptError};
use crate::domain::repository::ContentCipher;

/// AES 分组大小（字节）
pub const BLOCK_SIZE: usize = 16;

type Aes128EcbDec = ecb::Decryptor<Aes128>;
type Aes192EcbDec = ecb::Decryptor<Aes192>;
type Aes256EcbDec = ecb::Decryptor<Aes256>;
type Aes128EcbEnc = ecb::Encryptor<Aes128>;
type Aes192EcbEnc = ecb::Encryptor<Aes192>;
type Aes256EcbEnc = ecb::Encryptor<Aes256>;

/// 加密失败：密钥长度不是 16/24/32
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported key length {0}")]
pub struct KeyLengthError(pub usize);

/// 无状态 AES/ECB 解密器
#[derive(Debug, Clone, Copy, Default)]
pub struct AesEcbCipher;

impl AesEcbCipher {
    pub fn new() -> Self {
        Self
    }

    /// 与客户端相同方案的加密（测试和运维工具使用）
    pub fn encrypt(&self, plaintext: &str, key: &CipherKey) -> Result<String, KeyLengthError> {
        let message = plaintext.as_bytes();
        let message_len = message.len();
        let mut buf = vec![0u8; (message_len / BLOCK_SIZE + 1) * BLOCK_SIZE];
        buf[..message_len].copy_from_slice(message);

        let key = key.as_bytes();
        let invalid = |_| KeyLengthError(key.len());
        // 缓冲区总是留出一个完整的填充块，填充不会失败
        let ciphertext_len = match key.len() {
            16 => Aes128EcbEnc::new_from_slice(key)
                .map_err(invalid)?
                .encrypt_padded_mut::<Pkcs7>(&mut buf, message_len)
                .map(<[u8]>::len),
            24 => Aes192EcbEnc::new_from_slice(key)
                .map_err(invalid)?
                .encrypt_padded_mut::<Pkcs7>(&mut buf, message_len)
                .map(<[u8]>::len),
            32 => Aes256EcbEnc::new_from_slice(key)
                .map_err(invalid)?
                .encrypt_padded_mut::<Pkcs7>(&mut buf, message_len)
                .map(<[u8]>::len),
            other => return Err(KeyLengthError(other)),
        }
        .map_err(|_| KeyLengthError(key.len()))?;

        buf.truncate(ciphertext_len);
        Ok(STANDARD.encode(&buf))
    }
}

impl ContentCipher for AesEcbCipher {
    fn decrypt(&self, ciphertext_base64: &str, key: &CipherKey) -> Result<String, DecryptError> {
        // 客户端 Base64 编码带换行，解码前去掉空白
        let compact: String = ciphertext_base64
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let mut buf = STANDARD
            .decode(compact.as_bytes())
            .map_err(|_| DecryptError::InvalidBase64)?;

        if buf.is_empty() || buf.len() % BLOCK_SIZE != 0 {
            return Err(DecryptError::InvalidBlockLength(buf.len()));
        }

        let key = key.as_bytes();
        let invalid = |_| DecryptError::InvalidKeyLength(key.len());
        let plaintext_len = match key.len() {
            16 => Aes128EcbDec::new_from_slice(key)
                .map_err(invalid)?
                .decrypt_padded_mut::<Pkcs7>(&mut buf)
                .map(<[u8]>::len),
            24 => Aes192EcbDec::new_from_slice(key)
                .map_err(invalid)?
                .decrypt_padded_mut::<Pkcs7>(&mut buf)
                .map(<[u8]>::len),
            32 => Aes256EcbDec::new_from_slice(key)
                .map_err(invalid)?
                .decrypt_padded_mut::<Pkcs7>(&mut buf)
                .map(<[u8]>::len),
            other => return Err(DecryptError::InvalidKeyLength(other)),
        }
        .map_err(|_| DecryptError::InvalidPadding)?;

        buf.truncate(plaintext_len);
        String::from_utf8(buf).map_err(|_| DecryptError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_key() -> CipherKey {
        CipherKey::from("MySuperSecretKey")
    }

    #[test]
    fn test_decrypt_known_vectors() {
        let cipher = AesEcbCipher::new();
        assert_eq!(
            cipher.decrypt("FPSiKNZmL9ocaDahU+POoA==", &legacy_key()),
            Ok("hola".to_string())
        );
        assert_eq!(
            cipher.decrypt("DVPzApygl5LIWhnCEvjLnA==", &legacy_key()),
            Ok("Hello, world!".to_string())
        );
        // 恰好一个分组时会追加一个完整的填充块
        assert_eq!(
            cipher.decrypt(
                "fHKwBYi5nsy5JB5yO5HVP6do+mdGKSgOMcFcvJwfXas=",
                &legacy_key()
            ),
            Ok("exactly16bytes!!".to_string())
        );
    }

    #[test]
    fn test_encrypt_matches_legacy_ciphertext() {
        let cipher = AesEcbCipher::new();
        assert_eq!(
            cipher.encrypt("hola", &legacy_key()).unwrap(),
            "FPSiKNZmL9ocaDahU+POoA=="
        );
        assert_eq!(
            cipher.encrypt("exactly16bytes!!", &legacy_key()).unwrap(),
            "fHKwBYi5nsy5JB5yO5HVP6do+mdGKSgOMcFcvJwfXas="
        );
    }

    #[test]
    fn test_decrypt_tolerates_line_breaks() {
        let cipher = AesEcbCipher::new();
        assert_eq!(
            cipher.decrypt("FPSiKNZmL9ocaDah\nU+POoA==\n", &legacy_key()),
            Ok("hola".to_string())
        );
    }

    #[test]
    fn test_decrypt_rejects_invalid_base64() {
        let cipher = AesEcbCipher::new();
        assert_eq!(
            cipher.decrypt("not base64 at all!", &legacy_key()),
            Err(DecryptError::InvalidBase64)
        );
    }

    #[test]
    fn test_decrypt_rejects_partial_block() {
        let cipher = AesEcbCipher::new();
        // "hola" 的 Base64，4 字节
        assert_eq!(
            cipher.decrypt("aG9sYQ==", &legacy_key()),
            Err(DecryptError::InvalidBlockLength(4))
        );
        assert_eq!(
            cipher.decrypt("", &legacy_key()),
            Err(DecryptError::InvalidBlockLength(0))
        );
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails_padding() {
        let cipher = AesEcbCipher::new();
        // 使用 "OtherSecretKey16" 加密的 "hola"
        assert_eq!(
            cipher.decrypt("NiQxjSWevgwios1H/61WJw==", &legacy_key()),
            Err(DecryptError::InvalidPadding)
        );
    }

    #[test]
    fn test_unsupported_key_length() {
        let cipher = AesEcbCipher::new();
        let short = CipherKey::from("short");
        assert_eq!(
            cipher.decrypt("FPSiKNZmL9ocaDahU+POoA==", &short),
            Err(DecryptError::InvalidKeyLength(5))
        );
        assert_eq!(cipher.encrypt("hola", &short), Err(KeyLengthError(5)));
    }

    #[test]
    fn test_round_trip_with_aes256_key() {
        let cipher = AesEcbCipher::new();
        let key = CipherKey::from("0123456789abcdef0123456789abcdef");
        let encrypted = cipher.encrypt("mensaje largo con acentos: canción", &key).unwrap();
        assert_eq!(
            cipher.decrypt(&encrypted, &key),
            Ok("mensaje largo con acentos: canción".to_string())
        );
    }
}
