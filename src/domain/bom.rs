// ==========================================
// 多级 BOM 展开引擎 - BOM 表头领域模型
// ==========================================
// 依据: SAP PP MAST / STKO / STAS(优先级) / STZU
// 红线: 表头不可变，修订通过插入新的有效起始日期实现
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// BomHeader - BOM 表头 (STKO)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomHeader {
    pub material: String,    // MATNR
    pub plant: String,       // WERKS
    pub bom_number: String,  // STLNR
    pub alternative: String, // STLAL
    pub bom_usage: String,   // STLAN
    pub valid_from: NaiveDate, // DATUV
    pub base_quantity: f64,  // BMENG
}

// ==========================================
// MasterMapping - 物料与 BOM 关联 (MAST)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MasterMapping {
    pub material: String,
    pub plant: String,
    pub bom_number: String,
    pub alternative: String,
}

// ==========================================
// AlternativePriority - 替代优先级 (STAS.PRIOR)
// ==========================================
// 数值越小优先级越高
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativePriority {
    pub bom_number: String,
    pub alternative: String,
    pub priority: i32,
}

// ==========================================
// ChangeRecord - 工程变更记录 (STZU)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub bom_number: String,
    pub change_number: String, // AENNR
    pub valid_from: NaiveDate,
}

// ==========================================
// ResolvedHeader - 有效表头解析结果
// ==========================================
/// 关键日期下唯一有效的表头
///
/// 若存在生效的工程变更，`header.valid_from` 已被变更记录的日期覆盖，
/// 原始修订日期保留在 `revision_valid_from`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedHeader {
    pub bom_number: String,
    pub header: BomHeader,
    pub revision_valid_from: NaiveDate,
    pub change_number: Option<String>,
}

impl ResolvedHeader {
    pub fn new(header: BomHeader) -> Self {
        Self {
            bom_number: header.bom_number.clone(),
            revision_valid_from: header.valid_from,
            header,
            change_number: None,
        }
    }

    /// 叠加工程变更（仅影响归属信息，不影响组件选择）
    pub fn with_change(mut self, change: &ChangeRecord) -> Self {
        self.change_number = Some(change.change_number.clone());
        self.header.valid_from = change.valid_from;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> BomHeader {
        BomHeader {
            material: "MAT001".to_string(),
            plant: "PL01".to_string(),
            bom_number: "BOM001".to_string(),
            alternative: "01".to_string(),
            bom_usage: "1".to_string(),
            valid_from: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            base_quantity: 1.0,
        }
    }

    #[test]
    fn test_with_change_overlays_attribution_only() {
        let change = ChangeRecord {
            bom_number: "BOM001".to_string(),
            change_number: "ECN-42".to_string(),
            valid_from: NaiveDate::from_ymd_opt(2020, 6, 1).unwrap(),
        };

        let resolved = ResolvedHeader::new(header()).with_change(&change);

        assert_eq!(resolved.change_number.as_deref(), Some("ECN-42"));
        assert_eq!(resolved.header.valid_from, change.valid_from);
        assert_eq!(resolved.revision_valid_from, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(resolved.bom_number, "BOM001");
    }
}
