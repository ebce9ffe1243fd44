// ==========================================
// 多级 BOM 展开引擎 - 成本汇总
// ==========================================
// 依据: SAP MM MBEW 标准价 (MATNR, BWKEY=工厂)
// 规则: 左连接；未匹配或无价格的记录成本为空
// 规则: total_cost = total_quantity × standard_price
// 红线: 不修改输入记录，返回新序列
// ==========================================

use crate::domain::{CostRecord, ExplodedLeaf};
use std::collections::HashMap;

// ==========================================
// CostIndex - (物料, 评估范围) → 标准价
// ==========================================
// 同一键出现多次时取第一条
pub struct CostIndex<'a> {
    prices: HashMap<&'a str, HashMap<&'a str, Option<f64>>>,
}

impl<'a> CostIndex<'a> {
    pub fn new(costs: &'a [CostRecord]) -> Self {
        let mut prices: HashMap<&'a str, HashMap<&'a str, Option<f64>>> = HashMap::new();
        for cost in costs {
            prices
                .entry(cost.material.as_str())
                .or_default()
                .entry(cost.valuation_area.as_str())
                .or_insert(cost.standard_price);
        }
        Self { prices }
    }

    /// None: 无对应评估记录或价格为空
    pub fn standard_price(&self, material: &str, plant: &str) -> Option<f64> {
        self.prices
            .get(material)
            .and_then(|by_plant| by_plant.get(plant))
            .copied()
            .flatten()
    }

    /// 去重后的 (物料, 评估范围) 数量
    pub fn len(&self) -> usize {
        self.prices.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// 按 (组件, 工厂) 关联标准价并计算总成本
pub fn attach_cost(leaves: &[ExplodedLeaf], costs: &[CostRecord]) -> Vec<ExplodedLeaf> {
    let index = CostIndex::new(costs);
    leaves
        .iter()
        .map(|leaf| ExplodedLeaf {
            total_cost: index
                .standard_price(&leaf.component, &leaf.plant)
                .map(|price| leaf.total_quantity * price),
            ..leaf.clone()
        })
        .collect()
}
