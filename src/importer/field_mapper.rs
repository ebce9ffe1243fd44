// ==========================================
// 多级 BOM 展开引擎 - 字段映射器
// ==========================================
// 职责: 原始行 → 领域实体 + 类型转换
// 列名: 支持 SAP 字段代码及英文别名（大小写不敏感）
// 红线: 日期/数值格式错误直接失败
// ==========================================

use crate::domain::{
    AlternativePriority, BomHeader, ChangeRecord, ChangeTrackedComponent, CostRecord,
    MasterMapping, PlainComponent, SourceTable,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRow;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

/// STAS 一行可同时携带组件信息与替代优先级
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StasRow {
    pub component: Option<ChangeTrackedComponent>,
    pub priority: Option<AlternativePriority>,
}

pub struct FieldMapper {
    table: SourceTable,
}

impl FieldMapper {
    pub fn new(table: SourceTable) -> Self {
        Self { table }
    }

    pub fn map_mast(&self, row: &RawRow) -> ImportResult<MasterMapping> {
        Ok(MasterMapping {
            material: self.required(row, "MATNR")?,
            plant: self.required(row, "WERKS")?,
            bom_number: self.required(row, "STLNR")?,
            alternative: self.required_code(row, "STLAL")?,
        })
    }

    pub fn map_stko(&self, row: &RawRow) -> ImportResult<BomHeader> {
        Ok(BomHeader {
            material: self.required(row, "MATNR")?,
            plant: self.required(row, "WERKS")?,
            bom_number: self.required(row, "STLNR")?,
            alternative: self.required_code(row, "STLAL")?,
            bom_usage: self.get_string(row, "STLAN").unwrap_or_default(),
            valid_from: self.required_date(row, "DATUV")?,
            base_quantity: self.parse_f64(row, "BMENG")?.unwrap_or(1.0),
        })
    }

    pub fn map_stpo(&self, row: &RawRow) -> ImportResult<PlainComponent> {
        Ok(PlainComponent {
            bom_number: self.required(row, "STLNR")?,
            position: self.required_code(row, "POSNR")?,
            component: self.required(row, "IDNRK")?,
            quantity: self
                .parse_f64(row, "MENGE")?
                .ok_or_else(|| self.missing(row, "MENGE"))?,
            valid_from: self.required_date(row, "DATUV")?,
        })
    }

    pub fn map_stas(&self, row: &RawRow) -> ImportResult<StasRow> {
        let bom_number = self.required(row, "STLNR")?;

        let component = match self.get_string(row, "IDNRK") {
            Some(component) => Some(ChangeTrackedComponent {
                bom_number: bom_number.clone(),
                alternative: self.get_code(row, "STLAL").unwrap_or_default(),
                position: self.get_code(row, "POSNR").unwrap_or_default(),
                component,
                old_quantity: self.parse_f64(row, "ALT_MENGE")?,
                new_quantity: self.parse_f64(row, "NEU_MENGE")?,
                deletion_marker: self.parse_flag(row, "LOEKZ"),
            }),
            None => None,
        };

        let priority = match self.parse_i32(row, "PRIOR")? {
            Some(priority) => Some(AlternativePriority {
                bom_number,
                alternative: self.required_code(row, "STLAL")?,
                priority,
            }),
            None => None,
        };

        Ok(StasRow { component, priority })
    }

    pub fn map_stzu(&self, row: &RawRow) -> ImportResult<ChangeRecord> {
        Ok(ChangeRecord {
            bom_number: self.required(row, "STLNR")?,
            change_number: self.required(row, "AENNR")?,
            valid_from: self.required_date(row, "DATUV")?,
        })
    }

    pub fn map_mbew(&self, row: &RawRow) -> ImportResult<CostRecord> {
        Ok(CostRecord {
            material: self.required(row, "MATNR")?,
            valuation_area: self.required(row, "BWKEY")?,
            standard_price: self.parse_f64(row, "STPRS")?,
        })
    }

    // ==========================================
    // 字段读取
    // ==========================================

    /// 提取字符串字段，按别名依次尝试
    fn get_string(&self, row: &RawRow, key: &str) -> Option<String> {
        aliases(key)
            .iter()
            .find_map(|alias| row.get(alias))
            .map(|v| v.trim().to_string())
    }

    fn required(&self, row: &RawRow, key: &str) -> ImportResult<String> {
        self.get_string(row, key)
            .ok_or_else(|| self.missing(row, key))
    }

    /// 读取定长编码字段（STLAL/POSNR）
    ///
    /// Excel/SQLite 数值单元格会丢失前导零（"01" → "1"），按 SAP 编码宽度补零
    fn get_code(&self, row: &RawRow, key: &str) -> Option<String> {
        let value = self.get_string(row, key)?;
        let width = code_width(key);
        match numeric_code(&value) {
            Some(digits) if digits.len() < width => {
                let padded = format!("{:0>width$}", digits, width = width);
                warn!(
                    table = %self.table,
                    row = row.row_number,
                    field = key,
                    value = %value,
                    padded = %padded,
                    "编码字段按数值读入，已补齐前导零"
                );
                Some(padded)
            }
            _ => Some(value),
        }
    }

    fn required_code(&self, row: &RawRow, key: &str) -> ImportResult<String> {
        self.get_code(row, key)
            .ok_or_else(|| self.missing(row, key))
    }

    fn missing(&self, row: &RawRow, key: &str) -> ImportError {
        ImportError::FieldMissing {
            table: self.table.to_string(),
            row: row.row_number,
            field: key.to_string(),
        }
    }

    fn parse_f64(&self, row: &RawRow, key: &str) -> ImportResult<Option<f64>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => value
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ImportError::TypeConversionError {
                    table: self.table.to_string(),
                    row: row.row_number,
                    field: key.to_string(),
                    message: format!("无法解析为浮点数: {}", value),
                }),
        }
    }

    /// 解析整数（兼容 "1.0" 形式）
    fn parse_i32(&self, row: &RawRow, key: &str) -> ImportResult<Option<i32>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => value
                .parse::<i32>()
                .ok()
                .or_else(|| {
                    value
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.fract() == 0.0)
                        .map(|f| f as i32)
                })
                .map(Some)
                .ok_or_else(|| ImportError::TypeConversionError {
                    table: self.table.to_string(),
                    row: row.row_number,
                    field: key.to_string(),
                    message: format!("无法解析为整数: {}", value),
                }),
        }
    }

    fn required_date(&self, row: &RawRow, key: &str) -> ImportResult<NaiveDate> {
        let value = self.required(row, key)?;
        parse_date(&value).ok_or_else(|| ImportError::DateFormatError {
            table: self.table.to_string(),
            row: row.row_number,
            field: key.to_string(),
            value,
        })
    }

    /// 删除标记: X / TRUE / 1 视为已删除
    fn parse_flag(&self, row: &RawRow, key: &str) -> bool {
        self.get_string(row, key)
            .map(|v| matches!(v.to_uppercase().as_str(), "X" | "TRUE" | "1"))
            .unwrap_or(false)
    }
}

/// 解析日期（YYYY-MM-DD / YYYYMMDD / YYYY/MM/DD / 带时间部分）
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// SAP 编码字段宽度
fn code_width(key: &str) -> usize {
    match key {
        "STLAL" => 2,
        "POSNR" => 4,
        _ => 0,
    }
}

/// 纯数字（或整数值浮点 "1.0"）编码取数字部分；其他返回 None
fn numeric_code(value: &str) -> Option<&str> {
    let digits = value.strip_suffix(".0").unwrap_or(value);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

/// 列名别名（SAP 字段代码 → 可接受的列名）
fn aliases(key: &str) -> &'static [&'static str] {
    match key {
        "MATNR" => &["MATNR", "MATERIAL"],
        "WERKS" => &["WERKS", "PLANT"],
        "STLNR" => &["STLNR", "BOM_NUMBER", "BOM"],
        "STLAL" => &["STLAL", "ALTERNATIVE"],
        "STLAN" => &["STLAN", "BOM_USAGE"],
        "DATUV" => &["DATUV", "VALID_FROM"],
        "BMENG" => &["BMENG", "BASE_QUANTITY"],
        "POSNR" => &["POSNR", "POSITION"],
        "IDNRK" => &["IDNRK", "COMPONENT"],
        "MENGE" => &["MENGE", "QUANTITY"],
        "ALT_MENGE" => &["ALT_MENGE", "OLD_QUANTITY"],
        "NEU_MENGE" => &["NEU_MENGE", "NEW_QUANTITY"],
        "LOEKZ" => &["LOEKZ", "DELETION_FLAG"],
        "PRIOR" => &["PRIOR", "PRIORITY"],
        "AENNR" => &["AENNR", "CHANGE_NUMBER"],
        "BWKEY" => &["BWKEY", "VALUATION_AREA"],
        "STPRS" => &["STPRS", "STANDARD_PRICE"],
        _ => &[],
    }
}
