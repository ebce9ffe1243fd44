// ==========================================
// 多级 BOM 展开引擎 - 配置层
// ==========================================
// 职责: 展开配置加载与多级覆写
// 存储: JSON 配置文件 / config_kv 表
// ==========================================

pub mod config_manager;
pub mod error;
pub mod explosion_config;

// 重导出
pub use config_manager::{config_keys, ConfigManager};
pub use error::{ConfigError, ConfigResult};
pub use explosion_config::{ConfigOverrides, ExplosionConfig, DEFAULT_OUTPUT_PATH, DEFAULT_SOURCE_PATH};
