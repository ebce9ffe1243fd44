// ==========================================
// 多级 BOM 展开引擎 - 领域类型定义
// ==========================================
// 依据: SAP PP 物料清单数据模型 (MAST/STKO/STPO/STAS/STZU/MBEW)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 展开记录类型 (Record Kind)
// ==========================================
// COMPONENT: BOM 行展开出的组件记录（每个组件行都会输出）
// TERMINAL:  物料无 BOM 或 BOM 无组件时输出的末端记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    Component,
    Terminal,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl RecordKind {
    /// 从数据库/CSV 字符串解析（未知值按 COMPONENT 处理）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "TERMINAL" => RecordKind::Terminal,
            _ => RecordKind::Component,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RecordKind::Component => "COMPONENT",
            RecordKind::Terminal => "TERMINAL",
        }
    }
}

// ==========================================
// 子级替代选择策略 (Child Alternative Policy)
// ==========================================
// INHERIT:   子级沿用根节点的替代（SAP 默认展开行为）
// PREFERRED: 子级不指定替代，由替代优先级表选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChildAlternativePolicy {
    #[default]
    #[serde(alias = "inherit")]
    Inherit,
    #[serde(alias = "preferred")]
    Preferred,
}

impl fmt::Display for ChildAlternativePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildAlternativePolicy::Inherit => write!(f, "INHERIT"),
            ChildAlternativePolicy::Preferred => write!(f, "PREFERRED"),
        }
    }
}

impl ChildAlternativePolicy {
    /// 解析配置值（大小写不敏感），未知值返回 None
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "INHERIT" => Some(ChildAlternativePolicy::Inherit),
            "PREFERRED" => Some(ChildAlternativePolicy::Preferred),
            _ => None,
        }
    }
}

// ==========================================
// 源表标识 (Source Table)
// ==========================================
// 文件名/表名使用 SAP 表代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceTable {
    Mast, // 物料-BOM 关联
    Stko, // BOM 表头
    Stpo, // BOM 组件（历史）
    Stas, // 替代/变更组件 + 替代优先级
    Stzu, // 工程变更记录
    Mbew, // 物料评估（标准价）
}

impl SourceTable {
    pub const ALL: [SourceTable; 6] = [
        SourceTable::Mast,
        SourceTable::Stko,
        SourceTable::Stpo,
        SourceTable::Stas,
        SourceTable::Stzu,
        SourceTable::Mbew,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            SourceTable::Mast => "MAST",
            SourceTable::Stko => "STKO",
            SourceTable::Stpo => "STPO",
            SourceTable::Stas => "STAS",
            SourceTable::Stzu => "STZU",
            SourceTable::Mbew => "MBEW",
        }
    }

    /// 必需表缺失时直接失败；可选表缺失按空表处理
    pub fn is_required(&self) -> bool {
        matches!(self, SourceTable::Mast | SourceTable::Stko | SourceTable::Stpo)
    }
}

impl fmt::Display for SourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_name())
    }
}
