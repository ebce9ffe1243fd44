// ==========================================
// 多级 BOM 展开引擎 - 有效期解析器
// ==========================================
// 依据: SAP PP 表头选择规则 MAST → STKO (+STAS 优先级, +STZU 变更)
// 规则: 有效起始日期 ≤ 关键日期 中取最近的一条修订
// 规则: 未指定替代时取优先级数值最小的替代（并列取先出现者）
// 红线: 纯函数，不修改源表
// ==========================================

use crate::domain::{BomHeader, ChangeRecord, ResolvedHeader};
use crate::engine::tables::BomTables;
use chrono::NaiveDate;
use tracing::debug;

// ==========================================
// EffectivityResolver - 有效表头解析器
// ==========================================
pub struct EffectivityResolver<'a> {
    tables: &'a BomTables,
}

impl<'a> EffectivityResolver<'a> {
    pub fn new(tables: &'a BomTables) -> Self {
        Self { tables }
    }

    /// 解析物料在关键日期下唯一有效的 BOM 表头
    ///
    /// # 参数
    /// - `material`: 物料号
    /// - `plant`: 工厂（None 表示不限）
    /// - `alternative`: 替代（None 时尝试按优先级表选择）
    /// - `key_date`: 关键日期
    ///
    /// # 返回
    /// - Some(ResolvedHeader): 有效表头（已叠加工程变更）
    /// - None: 物料无 BOM，调用方按末端处理
    pub fn resolve_header(
        &self,
        material: &str,
        plant: Option<&str>,
        alternative: Option<&str>,
        key_date: NaiveDate,
    ) -> Option<ResolvedHeader> {
        let alternative = match alternative {
            Some(alt) => Some(alt),
            None if self.tables.has_priorities() => self.preferred_alternative_for(material, plant),
            None => None,
        };

        let mut mapped = false;
        let mut best: Option<&BomHeader> = None;

        for mapping in self
            .tables
            .mappings_for(material)
            .filter(|m| plant.map_or(true, |p| m.plant == p))
            .filter(|m| alternative.map_or(true, |a| m.alternative == a))
        {
            mapped = true;
            for header in self
                .tables
                .headers_for(&mapping.bom_number, &mapping.alternative, &mapping.plant)
                .filter(|h| h.valid_from <= key_date)
            {
                // 严格大于才替换：并列时保留先出现者
                if best.map_or(true, |b| header.valid_from > b.valid_from) {
                    best = Some(header);
                }
            }
        }

        if !mapped {
            debug!(material = %material, plant = ?plant, alternative = ?alternative, "无 MAST 关联，按末端处理");
            return None;
        }

        let header = match best {
            Some(h) => h,
            None => {
                debug!(material = %material, key_date = %key_date, "关键日期前无有效表头");
                return None;
            }
        };

        let resolved = ResolvedHeader::new(header.clone());
        match self.active_change(&resolved.bom_number, key_date) {
            Some(change) => Some(resolved.with_change(change)),
            None => Some(resolved),
        }
    }

    /// 按优先级表选择 BOM 的首选替代
    ///
    /// 优先级数值越小越优先；并列时取先出现者。BOM 无优先级记录时返回 None。
    pub fn preferred_alternative(&self, bom_number: &str) -> Option<&'a str> {
        self.tables
            .priorities_for(bom_number)
            .min_by_key(|p| p.priority)
            .map(|p| p.alternative.as_str())
    }

    /// 关键日期前最近生效的工程变更
    pub fn active_change(&self, bom_number: &str, key_date: NaiveDate) -> Option<&'a ChangeRecord> {
        let mut latest: Option<&'a ChangeRecord> = None;
        for change in self
            .tables
            .changes_for(bom_number)
            .filter(|c| c.valid_from <= key_date)
        {
            if latest.map_or(true, |l| change.valid_from > l.valid_from) {
                latest = Some(change);
            }
        }
        latest
    }

    fn preferred_alternative_for(&self, material: &str, plant: Option<&str>) -> Option<&'a str> {
        let first = self
            .tables
            .mappings_for(material)
            .find(|m| plant.map_or(true, |p| m.plant == p))?;
        self.preferred_alternative(&first.bom_number)
    }
}
