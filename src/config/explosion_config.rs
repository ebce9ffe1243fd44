// ==========================================
// 多级 BOM 展开引擎 - 展开配置
// ==========================================
// 优先级: 默认值 < JSON 配置文件 < config_kv 表 < 命令行参数
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::ChildAlternativePolicy;
use crate::engine::ExplosionOptions;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// 默认源数据目录
pub const DEFAULT_SOURCE_PATH: &str = "source_data";

/// 默认输出文件
pub const DEFAULT_OUTPUT_PATH: &str = "processed_data/exploded_bom.csv";

/// 展开配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionConfig {
    /// 关键日期（有效期判断基准）
    pub key_date: NaiveDate,

    /// 是否包含已删除组件（保留显式删除行并继续向下展开）
    pub include_deleted: bool,

    /// 根物料数量
    pub root_quantity: f64,

    /// 子级替代选择策略
    pub child_alternative_policy: ChildAlternativePolicy,

    /// 源表目录或 SQLite 数据库
    pub source_path: PathBuf,

    /// 输出文件（.csv 或 .db）
    pub output_path: PathBuf,
}

impl Default for ExplosionConfig {
    fn default() -> Self {
        Self {
            key_date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default(),
            include_deleted: false,
            root_quantity: 1.0,
            child_alternative_policy: ChildAlternativePolicy::Inherit,
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

impl ExplosionConfig {
    /// 从 JSON 文件加载（缺省字段取默认值）
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let config: ExplosionConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        info!(path = %path.display(), "展开配置已加载");
        Ok(config)
    }

    /// 验证配置有效性
    ///
    /// # 验证规则
    /// 1. 根数量必须为有限非负数
    /// 2. 源路径与输出路径不能为空
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.root_quantity.is_finite() || self.root_quantity < 0.0 {
            return Err(ConfigError::ConfigValueError {
                key: "root_quantity".to_string(),
                value: self.root_quantity.to_string(),
                message: "根数量必须为有限非负数".to_string(),
            });
        }

        for (key, path) in [("source_path", &self.source_path), ("output_path", &self.output_path)] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ConfigValueError {
                    key: key.to_string(),
                    value: String::new(),
                    message: "路径不能为空".to_string(),
                });
            }
        }

        Ok(())
    }

    /// 转换为引擎参数
    pub fn explosion_options(&self) -> ExplosionOptions {
        ExplosionOptions {
            key_date: self.key_date,
            include_deleted: self.include_deleted,
            root_quantity: self.root_quantity,
            child_alternative_policy: self.child_alternative_policy,
        }
    }
}

// ==========================================
// ConfigOverrides - 命令行覆写（优先级最高）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub key_date: Option<NaiveDate>,
    pub include_deleted: Option<bool>,
    pub child_alternative_policy: Option<ChildAlternativePolicy>,
    pub source_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
}

impl ConfigOverrides {
    /// 把已设置的项写入配置，返回写入项数
    pub fn apply(&self, config: &mut ExplosionConfig) -> usize {
        let mut applied = 0;
        if let Some(date) = self.key_date {
            config.key_date = date;
            applied += 1;
        }
        if let Some(flag) = self.include_deleted {
            config.include_deleted = flag;
            applied += 1;
        }
        if let Some(policy) = self.child_alternative_policy {
            config.child_alternative_policy = policy;
            applied += 1;
        }
        if let Some(path) = &self.source_path {
            config.source_path = path.clone();
            applied += 1;
        }
        if let Some(path) = &self.output_path {
            config.output_path = path.clone();
            applied += 1;
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ExplosionConfig::default();
        assert_eq!(config.key_date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert!(!config.include_deleted);
        assert_eq!(config.root_quantity, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{ "key_date": "2022-03-15", "include_deleted": true, "child_alternative_policy": "preferred" }}"#
        )
        .unwrap();

        let config = ExplosionConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.key_date, NaiveDate::from_ymd_opt(2022, 3, 15).unwrap());
        assert!(config.include_deleted);
        assert_eq!(config.child_alternative_policy, ChildAlternativePolicy::Preferred);
        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT_PATH));
    }

    #[test]
    fn test_negative_root_quantity_rejected() {
        let config = ExplosionConfig {
            root_quantity: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ConfigValueError { key, .. }) if key == "root_quantity"
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "key_date": "not-a-date" }}"#).unwrap();

        let result = ExplosionConfig::load_from_file(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_overrides_only_touch_set_fields() {
        let mut config = ExplosionConfig::default();
        let overrides = ConfigOverrides {
            include_deleted: Some(true),
            output_path: Some(PathBuf::from("out/bom.db")),
            ..Default::default()
        };

        assert_eq!(overrides.apply(&mut config), 2);
        assert!(config.include_deleted);
        assert_eq!(config.output_path, PathBuf::from("out/bom.db"));
        assert_eq!(config.key_date, ExplosionConfig::default().key_date);
    }
}
