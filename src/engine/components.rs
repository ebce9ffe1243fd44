// ==========================================
// 多级 BOM 展开引擎 - 组件集解析器
// ==========================================
// 依据: SAP PP STAS（替代/变更组件）优先于 STPO（历史组件）
// 规则: STPO 中每个项目号仅保留关键日期前最近的一次修订
// 红线: 纯函数，不修改源表
// ==========================================

use crate::domain::{ComponentRow, ComponentSet, PlainComponent};
use crate::engine::tables::BomTables;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::trace;

// ==========================================
// ComponentResolver - 组件集解析器
// ==========================================
pub struct ComponentResolver<'a> {
    tables: &'a BomTables,
}

impl<'a> ComponentResolver<'a> {
    pub fn new(tables: &'a BomTables) -> Self {
        Self { tables }
    }

    /// 解析 BOM 在关键日期下的有效组件集
    ///
    /// # 参数
    /// - `bom_number`: BOM 号
    /// - `key_date`: 关键日期（仅作用于历史组件表）
    /// - `include_deleted`: 是否保留带显式删除标记的变更组件
    ///
    /// # 返回
    /// - ComponentSet::ChangeTracked: 变更组件表有该 BOM 的记录
    /// - ComponentSet::Plain: 回退到历史组件表
    /// - ComponentSet::Empty: 无组件
    pub fn resolve_components(
        &self,
        bom_number: &str,
        key_date: NaiveDate,
        include_deleted: bool,
    ) -> ComponentSet {
        if self.tables.has_tracked_components(bom_number) {
            let rows: Vec<ComponentRow> = self
                .tables
                .tracked_components_for(bom_number)
                .filter(|c| include_deleted || !c.deletion_marker)
                .map(ComponentRow::from)
                .collect();

            trace!(bom = %bom_number, rows = rows.len(), "使用变更组件表");
            return if rows.is_empty() {
                ComponentSet::Empty
            } else {
                ComponentSet::ChangeTracked(rows)
            };
        }

        let rows = self.latest_plain_revisions(bom_number, key_date);
        trace!(bom = %bom_number, rows = rows.len(), "使用历史组件表");
        if rows.is_empty() {
            ComponentSet::Empty
        } else {
            ComponentSet::Plain(rows)
        }
    }

    /// 每个项目号取有效起始日期最大的一条（并列取先出现者），按项目号首次出现的顺序输出
    fn latest_plain_revisions(&self, bom_number: &str, key_date: NaiveDate) -> Vec<ComponentRow> {
        let mut slots: Vec<&PlainComponent> = Vec::new();
        let mut slot_by_position: HashMap<&str, usize> = HashMap::new();

        for row in self
            .tables
            .plain_components_for(bom_number)
            .filter(|c| c.valid_from <= key_date)
        {
            match slot_by_position.get(row.position.as_str()) {
                Some(&slot) => {
                    if row.valid_from > slots[slot].valid_from {
                        slots[slot] = row;
                    }
                }
                None => {
                    slot_by_position.insert(row.position.as_str(), slots.len());
                    slots.push(row);
                }
            }
        }

        slots.into_iter().map(ComponentRow::from).collect()
    }
}
