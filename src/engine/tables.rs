// ==========================================
// 多级 BOM 展开引擎 - 源表内存索引
// ==========================================
// 职责: 一次性加载全部源表并建立按键索引
// 红线: 展开过程中源表只读，不在递归中做 I/O
// ==========================================

use crate::domain::{
    AlternativePriority, BomHeader, ChangeRecord, ChangeTrackedComponent, CostRecord,
    MasterMapping, PlainComponent,
};
use std::collections::HashMap;

// ==========================================
// SourceTables - 原始表集合（加载器输出）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub mappings: Vec<MasterMapping>,
    pub headers: Vec<BomHeader>,
    pub plain_components: Vec<PlainComponent>,
    pub tracked_components: Vec<ChangeTrackedComponent>,
    pub priorities: Vec<AlternativePriority>,
    pub changes: Vec<ChangeRecord>,
    pub costs: Vec<CostRecord>,
}

/// (BOM 号, 替代, 工厂)
type HeaderKey = (String, String, String);

// ==========================================
// BomTables - 带索引的只读表集合
// ==========================================
// 索引中保存行下标，保持源表原始顺序
#[derive(Debug, Clone, Default)]
pub struct BomTables {
    source: SourceTables,
    mapping_by_material: HashMap<String, Vec<usize>>,
    header_by_key: HashMap<HeaderKey, Vec<usize>>,
    plain_by_bom: HashMap<String, Vec<usize>>,
    tracked_by_bom: HashMap<String, Vec<usize>>,
    priority_by_bom: HashMap<String, Vec<usize>>,
    change_by_bom: HashMap<String, Vec<usize>>,
}

impl BomTables {
    pub fn new(source: SourceTables) -> Self {
        let mapping_by_material = index_by(&source.mappings, |m| m.material.clone());
        let header_by_key = index_by(&source.headers, |h| {
            (h.bom_number.clone(), h.alternative.clone(), h.plant.clone())
        });
        let plain_by_bom = index_by(&source.plain_components, |c| c.bom_number.clone());
        let tracked_by_bom = index_by(&source.tracked_components, |c| c.bom_number.clone());
        let priority_by_bom = index_by(&source.priorities, |p| p.bom_number.clone());
        let change_by_bom = index_by(&source.changes, |c| c.bom_number.clone());

        Self {
            source,
            mapping_by_material,
            header_by_key,
            plain_by_bom,
            tracked_by_bom,
            priority_by_bom,
            change_by_bom,
        }
    }

    pub fn source(&self) -> &SourceTables {
        &self.source
    }

    pub fn mappings(&self) -> &[MasterMapping] {
        &self.source.mappings
    }

    pub fn costs(&self) -> &[CostRecord] {
        &self.source.costs
    }

    pub fn has_priorities(&self) -> bool {
        !self.source.priorities.is_empty()
    }

    pub fn mappings_for<'a>(&'a self, material: &str) -> impl Iterator<Item = &'a MasterMapping> + 'a {
        select(&self.source.mappings, self.mapping_by_material.get(material))
    }

    pub fn headers_for<'a>(
        &'a self,
        bom_number: &str,
        alternative: &str,
        plant: &str,
    ) -> impl Iterator<Item = &'a BomHeader> + 'a {
        let key = (
            bom_number.to_string(),
            alternative.to_string(),
            plant.to_string(),
        );
        select(&self.source.headers, self.header_by_key.get(&key))
    }

    pub fn plain_components_for<'a>(
        &'a self,
        bom_number: &str,
    ) -> impl Iterator<Item = &'a PlainComponent> + 'a {
        select(&self.source.plain_components, self.plain_by_bom.get(bom_number))
    }

    pub fn tracked_components_for<'a>(
        &'a self,
        bom_number: &str,
    ) -> impl Iterator<Item = &'a ChangeTrackedComponent> + 'a {
        select(&self.source.tracked_components, self.tracked_by_bom.get(bom_number))
    }

    pub fn has_tracked_components(&self, bom_number: &str) -> bool {
        self.tracked_by_bom
            .get(bom_number)
            .map_or(false, |rows| !rows.is_empty())
    }

    pub fn priorities_for<'a>(
        &'a self,
        bom_number: &str,
    ) -> impl Iterator<Item = &'a AlternativePriority> + 'a {
        select(&self.source.priorities, self.priority_by_bom.get(bom_number))
    }

    pub fn changes_for<'a>(&'a self, bom_number: &str) -> impl Iterator<Item = &'a ChangeRecord> + 'a {
        select(&self.source.changes, self.change_by_bom.get(bom_number))
    }
}

impl From<SourceTables> for BomTables {
    fn from(source: SourceTables) -> Self {
        Self::new(source)
    }
}

fn index_by<T, K, F>(rows: &[T], key: F) -> HashMap<K, Vec<usize>>
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut index: HashMap<K, Vec<usize>> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        index.entry(key(row)).or_default().push(idx);
    }
    index
}

fn select<'a, T>(rows: &'a [T], idx: Option<&'a Vec<usize>>) -> impl Iterator<Item = &'a T> + 'a {
    idx.into_iter().flatten().map(move |&i| &rows[i])
}
