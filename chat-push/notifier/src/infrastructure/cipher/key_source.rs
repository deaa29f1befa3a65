//! 解密密钥来源

use tracing::warn;

use crate::domain::model::CipherKey;
use crate::domain::repository::CipherKeySource;

/// 未配置密钥时使用的内置密钥（与客户端硬编码值一致）。
///
/// 不安全：任何拿到客户端安装包的人都能读到该值，生产部署必须通过
/// `CHAT_PUSH_CIPHER_KEY` 或配置文件提供密钥，并尽快移除该回退。
pub const INSECURE_FALLBACK_KEY: &str = "MySuperSecretKey";

/// 从进程配置中读取的密钥
#[derive(Debug, Clone)]
pub struct ConfiguredKeySource {
    configured: Option<CipherKey>,
}

impl ConfiguredKeySource {
    pub fn new(configured: Option<&str>) -> Self {
        Self {
            configured: configured
                .filter(|key| !key.is_empty())
                .map(CipherKey::from),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured.is_some()
    }
}

impl CipherKeySource for ConfiguredKeySource {
    fn cipher_key(&self) -> CipherKey {
        match &self.configured {
            Some(key) => key.clone(),
            None => {
                warn!("no cipher key configured, using insecure built-in fallback key");
                CipherKey::from(INSECURE_FALLBACK_KEY)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_key_wins() {
        let source = ConfiguredKeySource::new(Some("0123456789abcdef"));
        assert!(source.is_configured());
        assert_eq!(source.cipher_key(), CipherKey::from("0123456789abcdef"));
    }

    #[test]
    fn test_empty_or_missing_key_falls_back() {
        for source in [ConfiguredKeySource::new(None), ConfiguredKeySource::new(Some(""))] {
            assert!(!source.is_configured());
            assert_eq!(source.cipher_key(), CipherKey::from(INSECURE_FALLBACK_KEY));
        }
    }
}
