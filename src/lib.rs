// ==========================================
// 多级 BOM 展开引擎 - 核心库
// ==========================================
// 数据源: SAP MAST / STKO / STPO / STAS / STZU / MBEW
// 功能: 有效期与替代选择、变更组件、多级展开、成本汇总
// 技术栈: Rust + SQLite + CSV/Excel
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 解析与展开
pub mod engine;

// 导入层 - 源表读取
pub mod importer;

// 结果输出层
pub mod repository;

// 配置层
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 顶层错误
pub mod error;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ChildAlternativePolicy, ComponentSet, ExplodedLeaf, ExplosionReport, LeafFilter, RecordKind,
    ResolvedHeader, TruncatedPath,
};

// 引擎
pub use engine::{
    attach_cost, run_pipeline, BomTables, ComponentResolver, EffectivityResolver,
    ExplosionEngine, ExplosionOptions, ExplosionOrchestrator, SourceTables,
};

// 配置
pub use config::{ConfigOverrides, ExplosionConfig};

// 错误
pub use error::{ExplosionError, ExplosionResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "多级 BOM 展开引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(!APP_NAME.is_empty());
    }
}
