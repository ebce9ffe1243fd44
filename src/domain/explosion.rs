// ==========================================
// 多级 BOM 展开引擎 - 展开结果领域模型
// ==========================================
// 红线: 展开记录生成后不可修改，成本汇总产生新的序列
// 顺序: 按 MAST 表顺序，再按深度优先的组件顺序
// ==========================================

use crate::domain::bom::MasterMapping;
use crate::domain::types::RecordKind;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

// ==========================================
// ExplodedLeaf - 展开记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplodedLeaf {
    // ===== 展开根 =====
    pub root_material: String,
    pub plant: String,       // WERKS
    pub alternative: String, // STLAL

    // ===== 组件归属 =====
    pub parent_material: String, // 组件记录为上级物料，末端记录为末端物料本身
    pub bom: Option<String>, // 所属 BOM（根物料无 BOM 时为空）
    pub change_number: Option<String>,
    pub component: String,
    pub level: i32, // 根的直接组件为 0；根自身的末端记录为 -1
    pub kind: RecordKind,

    // ===== 数量 =====
    pub total_quantity: f64, // 路径上数量的连乘
    pub deleted: bool,
    pub alt_qty: Option<f64>,
    pub new_qty: Option<f64>,

    // ===== 成本（汇总后填充） =====
    pub total_cost: Option<f64>,
}

impl ExplodedLeaf {
    pub fn is_terminal(&self) -> bool {
        self.kind == RecordKind::Terminal
    }
}

// ==========================================
// TruncatedPath - 循环截断诊断
// ==========================================
/// 因循环引用而未继续展开的路径
///
/// `path` 从根物料开始，最后一个元素为重复出现的物料。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncatedPath {
    pub root_material: String,
    pub plant: String,
    pub path: Vec<String>,
}

impl TruncatedPath {
    /// 触发截断的物料
    pub fn repeated_material(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }
}

// ==========================================
// ExplosionReport - 单次展开运行结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplosionReport {
    pub run_id: String,
    pub key_date: NaiveDate,
    pub include_deleted: bool,
    pub root_count: usize,
    pub leaves: Vec<ExplodedLeaf>,
    pub truncated_paths: Vec<TruncatedPath>,
    pub unmatched_cost_count: usize,
}

impl ExplosionReport {
    pub fn new(key_date: NaiveDate, include_deleted: bool) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            key_date,
            include_deleted,
            root_count: 0,
            leaves: Vec::new(),
            truncated_paths: Vec::new(),
            unmatched_cost_count: 0,
        }
    }

    /// 已定价记录的成本合计
    pub fn total_cost(&self) -> f64 {
        self.leaves.iter().filter_map(|l| l.total_cost).sum()
    }
}

// ==========================================
// LeafFilter - 展示层筛选条件
// ==========================================
// None 表示"全部"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafFilter {
    pub material: Option<String>,
    pub plant: Option<String>,
    pub alternative: Option<String>,
}

impl LeafFilter {
    pub fn matches(&self, leaf: &ExplodedLeaf) -> bool {
        let material_ok = self
            .material
            .as_deref()
            .map_or(true, |m| leaf.root_material == m);
        let plant_ok = self.plant.as_deref().map_or(true, |p| leaf.plant == p);
        let alternative_ok = self
            .alternative
            .as_deref()
            .map_or(true, |a| leaf.alternative == a);
        material_ok && plant_ok && alternative_ok
    }

    pub fn apply<'a>(&self, leaves: &'a [ExplodedLeaf]) -> Vec<&'a ExplodedLeaf> {
        leaves.iter().filter(|l| self.matches(l)).collect()
    }
}

// ==========================================
// 下拉选项（排序去重）
// ==========================================

pub fn distinct_materials(mappings: &[MasterMapping]) -> Vec<String> {
    distinct_by(mappings, |m| &m.material)
}

pub fn distinct_plants(mappings: &[MasterMapping]) -> Vec<String> {
    distinct_by(mappings, |m| &m.plant)
}

pub fn distinct_alternatives(mappings: &[MasterMapping]) -> Vec<String> {
    distinct_by(mappings, |m| &m.alternative)
}

fn distinct_by<F>(mappings: &[MasterMapping], key: F) -> Vec<String>
where
    F: Fn(&MasterMapping) -> &String,
{
    mappings
        .iter()
        .map(key)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
