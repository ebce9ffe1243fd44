// ==========================================
// 多级 BOM 展开引擎 - 领域模型层
// ==========================================
// 职责: 定义源表实体、展开结果与领域类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod bom;
pub mod component;
pub mod cost;
pub mod explosion;
pub mod types;

// 重导出核心类型
pub use bom::{AlternativePriority, BomHeader, ChangeRecord, MasterMapping, ResolvedHeader};
pub use component::{ChangeTrackedComponent, ComponentRow, ComponentSet, PlainComponent};
pub use cost::CostRecord;
pub use explosion::{ExplodedLeaf, ExplosionReport, LeafFilter, TruncatedPath};
pub use types::{ChildAlternativePolicy, RecordKind, SourceTable};
