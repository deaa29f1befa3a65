//! 配置管理器 - 负责处理不同环境下的配置选择和覆盖
//!
//! 该模块提供了配置管理功能，包括：
//! - 获取当前运行环境
//! - 加载环境特定配置并合并到基础配置

use std::env;
use std::path::Path;

use anyhow::Result;
use toml::Value;

use super::{load_toml_value, merge_value};

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取当前环境名称
    ///
    /// 从环境变量 CHAT_PUSH_ENV 获取当前环境名称，
    /// 如果未设置则默认为 "development"
    pub fn get_environment() -> String {
        env::var("CHAT_PUSH_ENV").unwrap_or_else(|_| "development".to_string())
    }

    /// 根据环境加载特定配置
    ///
    /// 加载 `{config_root}/environments/{environment}.toml`，
    /// 并将其合并到基础配置中；文件不存在时不做任何修改
    ///
    /// # 参数
    /// * `base` - 基础配置，将被修改以包含环境特定配置
    /// * `config_root` - 配置根目录
    pub fn load_environment_config(base: &mut Value, config_root: &Path) -> Result<()> {
        Self::merge_environment(base, config_root, &Self::get_environment())
    }

    /// 合并指定环境的配置
    pub fn merge_environment(
        base: &mut Value,
        config_root: &Path,
        environment: &str,
    ) -> Result<()> {
        let env_config_path = config_root
            .join("environments")
            .join(format!("{environment}.toml"));

        if env_config_path.exists() {
            let env_config = load_toml_value(&env_config_path)?;
            merge_value(base, env_config);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_merge_environment_overlay() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("environments")).unwrap();
        fs::write(
            dir.path().join("environments/production.toml"),
            "[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();

        let mut base: Value = toml::from_str("[logging]\nlevel = \"debug\"\njson = true\n").unwrap();
        ConfigManager::merge_environment(&mut base, dir.path(), "production").unwrap();

        assert_eq!(base["logging"]["level"].as_str(), Some("warn"));
        assert_eq!(base["logging"]["json"].as_bool(), Some(true));
    }

    #[test]
    fn test_missing_environment_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut base: Value = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        ConfigManager::merge_environment(&mut base, dir.path(), "staging").unwrap();
        assert_eq!(base["logging"]["level"].as_str(), Some("debug"));
    }
}
