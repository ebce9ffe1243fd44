// ==========================================
// 多级 BOM 展开引擎 - 引擎层
// ==========================================
// 组成: 有效期解析 → 组件集解析 → 多级展开 → 成本汇总
// 红线: 引擎只读已加载源表，展开过程中无 I/O
// ==========================================

pub mod components;
pub mod cost_rollup;
pub mod effectivity;
pub mod explosion;
pub mod orchestrator;
pub mod tables;

// 重导出
pub use components::ComponentResolver;
pub use cost_rollup::{attach_cost, CostIndex};
pub use effectivity::EffectivityResolver;
pub use explosion::{ExplosionEngine, ExplosionOptions, ExplosionOutcome};
pub use orchestrator::{run_pipeline, ExplosionOrchestrator};
pub use tables::{BomTables, SourceTables};
