// ==========================================
// 多级 BOM 展开引擎 - 物料评估（成本）
// ==========================================
// 依据: SAP MM MBEW（评估范围 = 工厂）
// ==========================================

use serde::{Deserialize, Serialize};

/// 物料标准价 (MBEW)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub material: String,             // MATNR
    pub valuation_area: String,       // BWKEY
    pub standard_price: Option<f64>,  // STPRS
}
