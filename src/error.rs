// ==========================================
// 多级 BOM 展开引擎 - 顶层错误类型
// ==========================================
// 职责: 汇总各层错误，供展开流水线入口使用
// ==========================================

use crate::config::ConfigError;
use crate::importer::ImportError;
use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplosionError {
    #[error("源数据导入失败: {0}")]
    Import(#[from] ImportError),

    #[error("结果写出失败: {0}")]
    Repository(#[from] RepositoryError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

pub type ExplosionResult<T> = Result<T, ExplosionError>;
