// ==========================================
// 多级 BOM 展开引擎 - 配置管理器
// ==========================================
// 存储: SQLite 源库中的 config_kv 表 (key-value + scope)
// 职责: 读取 global scope 配置并覆写展开配置
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::explosion_config::ExplosionConfig;
use crate::db::{open_sqlite_connection, table_exists};
use crate::domain::ChildAlternativePolicy;
use crate::importer::parse_date;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const KEY_DATE: &str = "bom_explosion/key_date";
    pub const INCLUDE_DELETED: &str = "bom_explosion/include_deleted";
    pub const ROOT_QUANTITY: &str = "bom_explosion/root_quantity";
    pub const CHILD_ALTERNATIVE_POLICY: &str = "bom_explosion/child_alternative_policy";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| ConfigError::ConfigReadError {
            key: "*".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在（或 config_kv 表不存在）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let read_err = |e: rusqlite::Error| ConfigError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        };

        let conn = self.conn.lock().map_err(|e| ConfigError::ConfigReadError {
            key: key.to_string(),
            message: format!("锁获取失败: {}", e),
        })?;

        if !table_exists(&conn, "config_kv").map_err(read_err)? {
            return Ok(None);
        }

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(read_err(e)),
        }
    }

    /// 用 config_kv 中的值覆写展开配置
    ///
    /// # 返回
    /// - 被覆写的配置项数量
    pub fn apply_overrides(&self, config: &mut ExplosionConfig) -> ConfigResult<usize> {
        let mut applied = 0;

        if let Some(value) = self.get_global_config_value(config_keys::KEY_DATE)? {
            config.key_date = parse_date(&value)
                .ok_or_else(|| value_error(config_keys::KEY_DATE, &value, "日期格式错误"))?;
            applied += 1;
        }

        if let Some(value) = self.get_global_config_value(config_keys::INCLUDE_DELETED)? {
            config.include_deleted = parse_bool(&value)
                .ok_or_else(|| value_error(config_keys::INCLUDE_DELETED, &value, "布尔值格式错误"))?;
            applied += 1;
        }

        if let Some(value) = self.get_global_config_value(config_keys::ROOT_QUANTITY)? {
            config.root_quantity = value
                .trim()
                .parse::<f64>()
                .map_err(|_| value_error(config_keys::ROOT_QUANTITY, &value, "无法解析为浮点数"))?;
            applied += 1;
        }

        if let Some(value) = self.get_global_config_value(config_keys::CHILD_ALTERNATIVE_POLICY)? {
            config.child_alternative_policy = ChildAlternativePolicy::parse(&value).ok_or_else(|| {
                value_error(
                    config_keys::CHILD_ALTERNATIVE_POLICY,
                    &value,
                    "仅支持 INHERIT / PREFERRED",
                )
            })?;
            applied += 1;
        }

        if applied > 0 {
            config.validate()?;
            info!(applied = applied, "已应用 config_kv 覆写");
        } else {
            debug!("config_kv 无展开配置覆写");
        }
        Ok(applied)
    }
}

fn value_error(key: &str, value: &str, message: &str) -> ConfigError {
    ConfigError::ConfigValueError {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "x" => Some(true),
        "false" | "0" | "no" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn manager_with(entries: &[(&str, &str)]) -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE config_kv (
                scope_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (scope_id, key)
            );
            "#,
        )
        .unwrap();
        for (key, value) in entries {
            conn.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
                params![key, value],
            )
            .unwrap();
        }
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_overrides_applied() {
        let manager = manager_with(&[
            (config_keys::KEY_DATE, "20220101"),
            (config_keys::INCLUDE_DELETED, "true"),
            (config_keys::CHILD_ALTERNATIVE_POLICY, "PREFERRED"),
        ]);
        let mut config = ExplosionConfig::default();

        let applied = manager.apply_overrides(&mut config).unwrap();

        assert_eq!(applied, 3);
        assert_eq!(config.key_date, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert!(config.include_deleted);
        assert_eq!(config.child_alternative_policy, ChildAlternativePolicy::Preferred);
        assert_eq!(config.root_quantity, 1.0);
    }

    #[test]
    fn test_missing_table_means_no_overrides() {
        let conn = Connection::open_in_memory().unwrap();
        let manager = ConfigManager::from_connection(Arc::new(Mutex::new(conn)));
        let mut config = ExplosionConfig::default();

        assert_eq!(manager.apply_overrides(&mut config).unwrap(), 0);
        assert_eq!(config, ExplosionConfig::default());
    }

    #[test]
    fn test_invalid_override_value_is_error() {
        let manager = manager_with(&[(config_keys::ROOT_QUANTITY, "lots")]);
        let mut config = ExplosionConfig::default();

        assert!(matches!(
            manager.apply_overrides(&mut config),
            Err(ConfigError::ConfigValueError { .. })
        ));
    }
}
