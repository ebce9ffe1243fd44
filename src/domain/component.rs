// ==========================================
// 多级 BOM 展开引擎 - BOM 组件领域模型
// ==========================================
// 依据: SAP PP STPO（历史组件）/ STAS（替代/变更组件）
// ==========================================
// 注: 两张组件表在每个 BOM 上只解析一次，结果为 ComponentSet 变体
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// PlainComponent - 历史组件行 (STPO)
// ==========================================
// 同一项目号可有多个有效起始日期，仅取关键日期前最近的一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlainComponent {
    pub bom_number: String, // STLNR
    pub position: String,   // POSNR
    pub component: String,  // IDNRK
    pub quantity: f64,      // MENGE
    pub valid_from: NaiveDate,
}

// ==========================================
// ChangeTrackedComponent - 替代/变更组件行 (STAS)
// ==========================================
// 存在时覆盖 STPO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeTrackedComponent {
    pub bom_number: String,
    pub alternative: String,
    pub position: String,
    pub component: String,
    pub old_quantity: Option<f64>, // ALT_MENGE
    pub new_quantity: Option<f64>, // NEU_MENGE
    pub deletion_marker: bool,     // LOEKZ = 'X'
}

impl ChangeTrackedComponent {
    /// 逻辑删除：显式删除标记，或新数量恰好为 0
    pub fn is_deleted(&self) -> bool {
        self.deletion_marker || self.new_quantity == Some(0.0)
    }
}

// ==========================================
// ComponentRow - 有效组件行（统一视图）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRow {
    pub position: String,
    pub component: String,
    /// 变更前数量（仅变更表提供）
    pub old_quantity: Option<f64>,
    /// 生效数量：变更表取新数量，历史表取 MENGE
    pub quantity: Option<f64>,
    pub deleted: bool,
}

impl ComponentRow {
    /// 展开乘数（无数量字段时按 1.0）
    pub fn multiplier(&self) -> f64 {
        self.quantity.unwrap_or(1.0)
    }
}

impl From<&PlainComponent> for ComponentRow {
    fn from(row: &PlainComponent) -> Self {
        Self {
            position: row.position.clone(),
            component: row.component.clone(),
            old_quantity: None,
            quantity: Some(row.quantity),
            deleted: false,
        }
    }
}

impl From<&ChangeTrackedComponent> for ComponentRow {
    fn from(row: &ChangeTrackedComponent) -> Self {
        Self {
            position: row.position.clone(),
            component: row.component.clone(),
            old_quantity: row.old_quantity,
            quantity: row.new_quantity,
            deleted: row.is_deleted(),
        }
    }
}

// ==========================================
// ComponentSet - 组件集解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentSet {
    /// 来自替代/变更组件表（权威）
    ChangeTracked(Vec<ComponentRow>),
    /// 来自历史组件表（按项目号取最近修订）
    Plain(Vec<ComponentRow>),
    /// 无组件，所属物料视为末端
    Empty,
}

impl ComponentSet {
    pub fn rows(&self) -> &[ComponentRow] {
        match self {
            ComponentSet::ChangeTracked(rows) | ComponentSet::Plain(rows) => rows,
            ComponentSet::Empty => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }
}
