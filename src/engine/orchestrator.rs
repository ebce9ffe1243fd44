// ==========================================
// 多级 BOM 展开引擎 - 展开编排器
// ==========================================
// 流程: 加载源表 → 逐根展开 (MAST 顺序) → 成本汇总 → 写出
// 入口: (key_date, include_deleted) → 带成本的展开记录表
// ==========================================

use crate::config::{ConfigManager, ConfigOverrides, ExplosionConfig};
use crate::domain::ExplosionReport;
use crate::engine::cost_rollup::attach_cost;
use crate::engine::explosion::ExplosionEngine;
use crate::engine::tables::BomTables;
use crate::error::ExplosionResult;
use crate::importer::{is_sqlite_path, open_source, ImportResult, TableSource};
use crate::repository::open_sink;
use chrono::NaiveDate;
use std::time::Instant;
use tracing::{debug, info, warn};

// ==========================================
// ExplosionOrchestrator - 展开编排器
// ==========================================
pub struct ExplosionOrchestrator {
    tables: BomTables,
    config: ExplosionConfig,
}

impl ExplosionOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    /// - tables: 已加载的源表
    /// - config: 展开配置（根数量、子级替代策略）
    pub fn new(tables: BomTables, config: ExplosionConfig) -> Self {
        Self { tables, config }
    }

    /// 从数据源一次性加载全部源表
    pub fn from_source(source: &dyn TableSource, config: ExplosionConfig) -> ImportResult<Self> {
        let tables = BomTables::new(source.load()?);
        Ok(Self::new(tables, config))
    }

    pub fn tables(&self) -> &BomTables {
        &self.tables
    }

    pub fn config(&self) -> &ExplosionConfig {
        &self.config
    }

    /// 按配置中的关键日期与删除开关展开
    pub fn run(&self) -> ExplosionReport {
        self.explode(self.config.key_date, self.config.include_deleted)
    }

    /// 展开 MAST 中的全部根并附加成本
    ///
    /// # 参数
    /// - key_date: 有效期判断基准日
    /// - include_deleted: 是否保留并继续展开已删除组件
    ///
    /// # 返回
    /// - ExplosionReport: 按 MAST 顺序拼接的记录、截断路径与未定价计数
    pub fn explode(&self, key_date: NaiveDate, include_deleted: bool) -> ExplosionReport {
        let start = Instant::now();

        let mut options = self.config.explosion_options();
        options.key_date = key_date;
        options.include_deleted = include_deleted;

        let engine = ExplosionEngine::new(&self.tables, options);
        let mappings = self.tables.mappings();
        let outcome = engine.explode_all(mappings);

        let leaves = attach_cost(&outcome.leaves, self.tables.costs());
        let unmatched = leaves.iter().filter(|l| l.total_cost.is_none()).count();

        let mut report = ExplosionReport::new(key_date, include_deleted);
        report.root_count = mappings.len();
        report.leaves = leaves;
        report.truncated_paths = outcome.truncated_paths;
        report.unmatched_cost_count = unmatched;

        if !report.truncated_paths.is_empty() {
            warn!(
                run_id = %report.run_id,
                truncated = report.truncated_paths.len(),
                "展开过程中截断了循环路径"
            );
        }
        if unmatched > 0 {
            debug!(unmatched = unmatched, "部分记录无标准价");
        }

        info!(
            run_id = %report.run_id,
            key_date = %key_date,
            include_deleted = include_deleted,
            roots = report.root_count,
            records = report.leaves.len(),
            total_cost = report.total_cost(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "BOM 展开完成"
        );

        report
    }
}

// ==========================================
// 完整流水线
// ==========================================

/// 读取 → 展开 → 写出
///
/// # 配置优先级
/// 默认值 < JSON 文件（调用方已加载）< 源库 config_kv < 命令行覆写
pub fn run_pipeline(
    mut config: ExplosionConfig,
    overrides: &ConfigOverrides,
) -> ExplosionResult<ExplosionReport> {
    overrides.apply(&mut config);

    if is_sqlite_path(&config.source_path) && config.source_path.is_file() {
        let manager = ConfigManager::new(&config.source_path.to_string_lossy())?;
        if manager.apply_overrides(&mut config)? > 0 {
            overrides.apply(&mut config);
        }
    }
    config.validate()?;

    let source = open_source(&config.source_path)?;
    info!(source = %source.describe(), "开始加载源表");
    let orchestrator = ExplosionOrchestrator::from_source(source.as_ref(), config)?;

    let report = orchestrator.run();

    let sink = open_sink(&orchestrator.config().output_path)?;
    let written = sink.write_run(&report.run_id, &report.leaves)?;
    info!(run_id = %report.run_id, sink = %sink.describe(), rows = written, "展开结果已写出");

    Ok(report)
}
