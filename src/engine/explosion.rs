// ==========================================
// 多级 BOM 展开引擎 - 展开引擎
// ==========================================
// 依据: SAP CS12 多级展开（深度优先）
// 规则: 累计数量 = 根数量 × 路径上各组件数量的连乘
// 规则: 每个组件行都输出一条 COMPONENT 记录；无 BOM/无组件的物料输出 TERMINAL 记录
// 层级: 根的直接组件为 0 级；末端记录沿用引入它的组件记录层级
// 红线: 同一路径上物料只进入一次（循环截断），不同兄弟路径互不影响
// ==========================================
// 状态: 每一步返回自己的记录，由调用方合并；无全局可变状态
// ==========================================

use crate::domain::{
    ChildAlternativePolicy, ExplodedLeaf, MasterMapping, RecordKind, TruncatedPath,
};
use crate::engine::components::ComponentResolver;
use crate::engine::effectivity::EffectivityResolver;
use crate::engine::tables::BomTables;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ==========================================
// ExplosionOptions - 展开参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplosionOptions {
    pub key_date: NaiveDate,
    pub include_deleted: bool,
    pub root_quantity: f64,
    pub child_alternative_policy: ChildAlternativePolicy,
}

impl ExplosionOptions {
    pub fn new(key_date: NaiveDate, include_deleted: bool) -> Self {
        Self {
            key_date,
            include_deleted,
            root_quantity: 1.0,
            child_alternative_policy: ChildAlternativePolicy::Inherit,
        }
    }
}

// ==========================================
// ExplosionOutcome - 单根展开结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplosionOutcome {
    pub leaves: Vec<ExplodedLeaf>,
    pub truncated_paths: Vec<TruncatedPath>,
}

impl ExplosionOutcome {
    fn single(leaf: ExplodedLeaf) -> Self {
        Self {
            leaves: vec![leaf],
            truncated_paths: Vec::new(),
        }
    }

    pub fn merge(&mut self, other: ExplosionOutcome) {
        self.leaves.extend(other.leaves);
        self.truncated_paths.extend(other.truncated_paths);
    }
}

// ==========================================
// PathNode - 当前路径（栈上借用的不可变链表）
// ==========================================
struct PathNode<'p> {
    material: &'p str,
    parent: Option<&'p PathNode<'p>>,
}

impl<'p> PathNode<'p> {
    fn contains(&self, material: &str) -> bool {
        let mut node = Some(self);
        while let Some(n) = node {
            if n.material == material {
                return true;
            }
            node = n.parent;
        }
        false
    }

    /// 从根到当前节点
    fn to_vec(&self) -> Vec<String> {
        let mut path = Vec::new();
        let mut node = Some(self);
        while let Some(n) = node {
            path.push(n.material.to_string());
            node = n.parent;
        }
        path.reverse();
        path
    }
}

/// 展开根（MAST 一行）
struct RootContext<'r> {
    material: &'r str,
    plant: &'r str,
    alternative: &'r str,
}

// ==========================================
// ExplosionEngine - 展开引擎
// ==========================================
pub struct ExplosionEngine<'a> {
    effectivity: EffectivityResolver<'a>,
    components: ComponentResolver<'a>,
    options: ExplosionOptions,
}

impl<'a> ExplosionEngine<'a> {
    pub fn new(tables: &'a BomTables, options: ExplosionOptions) -> Self {
        Self {
            effectivity: EffectivityResolver::new(tables),
            components: ComponentResolver::new(tables),
            options,
        }
    }

    pub fn options(&self) -> &ExplosionOptions {
        &self.options
    }

    /// 展开 MAST 中的一行 (物料, 工厂, 替代)
    pub fn explode_root(&self, mapping: &MasterMapping) -> ExplosionOutcome {
        let root = RootContext {
            material: &mapping.material,
            plant: &mapping.plant,
            alternative: &mapping.alternative,
        };

        let outcome = self.visit(&root, root.material, None, None, 0, self.options.root_quantity);

        debug!(
            material = %mapping.material,
            plant = %mapping.plant,
            alternative = %mapping.alternative,
            records = outcome.leaves.len(),
            truncated = outcome.truncated_paths.len(),
            "根物料展开完成"
        );
        outcome
    }

    /// 按给定顺序展开多个根，结果依次拼接
    pub fn explode_all<'m, I>(&self, mappings: I) -> ExplosionOutcome
    where
        I: IntoIterator<Item = &'m MasterMapping>,
    {
        let mut outcome = ExplosionOutcome::default();
        for mapping in mappings {
            outcome.merge(self.explode_root(mapping));
        }
        outcome
    }

    fn visit(
        &self,
        root: &RootContext<'_>,
        material: &str,
        parent: Option<&PathNode<'_>>,
        parent_bom: Option<&str>,
        depth: u32,
        quantity: f64,
    ) -> ExplosionOutcome {
        // 循环截断：路径上已有该物料则不再进入
        if let Some(path) = parent {
            if path.contains(material) {
                let mut cycle = path.to_vec();
                cycle.push(material.to_string());
                debug!(root = %root.material, path = ?cycle, "检测到循环引用，截断");
                return ExplosionOutcome {
                    leaves: Vec::new(),
                    truncated_paths: vec![TruncatedPath {
                        root_material: root.material.to_string(),
                        plant: root.plant.to_string(),
                        path: cycle,
                    }],
                };
            }
        }

        let alternative = match (depth, self.options.child_alternative_policy) {
            (0, _) | (_, ChildAlternativePolicy::Inherit) => Some(root.alternative),
            (_, ChildAlternativePolicy::Preferred) => None,
        };

        let resolved = match self.effectivity.resolve_header(
            material,
            Some(root.plant),
            alternative,
            self.options.key_date,
        ) {
            Some(r) => r,
            None => {
                return ExplosionOutcome::single(self.terminal(
                    root,
                    parent_bom,
                    material,
                    depth,
                    quantity,
                ))
            }
        };

        let set = self.components.resolve_components(
            &resolved.bom_number,
            self.options.key_date,
            self.options.include_deleted,
        );
        if set.is_empty() {
            return ExplosionOutcome::single(self.terminal(
                root,
                Some(&resolved.bom_number),
                material,
                depth,
                quantity,
            ));
        }

        let node = PathNode { material, parent };
        let mut outcome = ExplosionOutcome::default();

        for row in set.rows() {
            let cumulative = quantity * row.multiplier();
            outcome.leaves.push(ExplodedLeaf {
                root_material: root.material.to_string(),
                plant: root.plant.to_string(),
                alternative: root.alternative.to_string(),
                parent_material: material.to_string(),
                bom: Some(resolved.bom_number.clone()),
                change_number: resolved.change_number.clone(),
                component: row.component.clone(),
                level: depth as i32,
                kind: RecordKind::Component,
                total_quantity: cumulative,
                deleted: row.deleted,
                alt_qty: row.old_quantity,
                new_qty: row.quantity,
                total_cost: None,
            });

            if !row.deleted || self.options.include_deleted {
                outcome.merge(self.visit(
                    root,
                    &row.component,
                    Some(&node),
                    Some(&resolved.bom_number),
                    depth + 1,
                    cumulative,
                ));
            }
        }

        outcome
    }

    /// 末端记录：物料列即末端物料本身，层级与引入它的组件记录相同（根为 -1）
    fn terminal(
        &self,
        root: &RootContext<'_>,
        bom: Option<&str>,
        material: &str,
        depth: u32,
        quantity: f64,
    ) -> ExplodedLeaf {
        ExplodedLeaf {
            root_material: root.material.to_string(),
            plant: root.plant.to_string(),
            alternative: root.alternative.to_string(),
            parent_material: material.to_string(),
            bom: bom.map(str::to_string),
            change_number: None,
            component: material.to_string(),
            level: depth as i32 - 1,
            kind: RecordKind::Terminal,
            total_quantity: quantity,
            deleted: false,
            alt_qty: Some(quantity),
            new_qty: Some(quantity),
            total_cost: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BomHeader, ChangeTrackedComponent, PlainComponent};
    use crate::engine::tables::SourceTables;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bom(material: &str, bom_number: &str, components: &[(&str, f64)], tables: &mut SourceTables) {
        tables.mappings.push(MasterMapping {
            material: material.to_string(),
            plant: "PL01".to_string(),
            bom_number: bom_number.to_string(),
            alternative: "01".to_string(),
        });
        tables.headers.push(BomHeader {
            material: material.to_string(),
            plant: "PL01".to_string(),
            bom_number: bom_number.to_string(),
            alternative: "01".to_string(),
            bom_usage: "1".to_string(),
            valid_from: d(2020, 1, 1),
            base_quantity: 1.0,
        });
        for (idx, (component, qty)) in components.iter().enumerate() {
            tables.plain_components.push(PlainComponent {
                bom_number: bom_number.to_string(),
                position: format!("{:04}", (idx + 1) * 10),
                component: component.to_string(),
                quantity: *qty,
                valid_from: d(2020, 1, 1),
            });
        }
    }

    fn root_mapping(tables: &BomTables, material: &str) -> MasterMapping {
        tables.mappings_for(material).next().unwrap().clone()
    }

    #[test]
    fn test_quantities_multiply_along_path() {
        let mut source = SourceTables::default();
        bom("MAT001", "BOM001", &[("MAT002", 2.0), ("MAT003", 4.0)], &mut source);
        bom("MAT002", "BOM002", &[("MAT004", 1.0), ("MAT005", 3.0)], &mut source);
        let tables = BomTables::new(source);
        let engine = ExplosionEngine::new(&tables, ExplosionOptions::new(d(2021, 1, 1), false));

        let outcome = engine.explode_root(&root_mapping(&tables, "MAT001"));
        let components: Vec<_> = outcome
            .leaves
            .iter()
            .filter(|l| l.kind == RecordKind::Component)
            .map(|l| (l.component.as_str(), l.level, l.total_quantity))
            .collect();

        assert_eq!(
            components,
            vec![
                ("MAT002", 0, 2.0),
                ("MAT004", 1, 2.0),
                ("MAT005", 1, 6.0),
                ("MAT003", 0, 4.0),
            ]
        );
        assert!(outcome.truncated_paths.is_empty());
    }

    #[test]
    fn test_terminal_records_for_materials_without_bom() {
        let mut source = SourceTables::default();
        bom("MAT001", "BOM001", &[("MAT002", 2.0)], &mut source);
        let tables = BomTables::new(source);
        let engine = ExplosionEngine::new(&tables, ExplosionOptions::new(d(2021, 1, 1), false));

        let outcome = engine.explode_root(&root_mapping(&tables, "MAT001"));
        assert_eq!(outcome.leaves.len(), 2);

        let terminal = &outcome.leaves[1];
        assert_eq!(terminal.kind, RecordKind::Terminal);
        assert_eq!(terminal.component, "MAT002");
        assert_eq!(terminal.parent_material, "MAT002");
        assert_eq!(terminal.bom.as_deref(), Some("BOM001"));
        assert_eq!(terminal.level, outcome.leaves[0].level);
        assert_eq!(terminal.level, 0);
        assert_eq!(terminal.total_quantity, 2.0);
    }

    #[test]
    fn test_root_without_components_is_terminal() {
        let mut source = SourceTables::default();
        bom("MAT001", "BOM001", &[], &mut source);
        let tables = BomTables::new(source);
        let engine = ExplosionEngine::new(&tables, ExplosionOptions::new(d(2021, 1, 1), false));

        let outcome = engine.explode_root(&root_mapping(&tables, "MAT001"));
        assert_eq!(outcome.leaves.len(), 1);
        assert_eq!(outcome.leaves[0].component, "MAT001");
        assert_eq!(outcome.leaves[0].level, -1);
        assert_eq!(outcome.leaves[0].parent_material, "MAT001");
        assert_eq!(outcome.leaves[0].bom.as_deref(), Some("BOM001"));
    }

    #[test]
    fn test_cycle_is_truncated_and_reported() {
        let mut source = SourceTables::default();
        bom("A", "BOM_A", &[("B", 2.0)], &mut source);
        bom("B", "BOM_B", &[("A", 3.0)], &mut source);
        let tables = BomTables::new(source);
        let engine = ExplosionEngine::new(&tables, ExplosionOptions::new(d(2021, 1, 1), false));

        let outcome = engine.explode_root(&root_mapping(&tables, "A"));
        let components: Vec<_> = outcome.leaves.iter().map(|l| l.component.as_str()).collect();
        assert_eq!(components, vec!["B", "A"]);
        assert_eq!(outcome.truncated_paths.len(), 1);
        assert_eq!(outcome.truncated_paths[0].path, vec!["A", "B", "A"]);
    }

    #[test]
    fn test_visited_set_is_path_local() {
        // 同一物料经两个兄弟分支到达，两次都应展开
        let mut source = SourceTables::default();
        bom("ROOT", "BOM_R", &[("X", 1.0), ("Y", 1.0)], &mut source);
        bom("X", "BOM_X", &[("SHARED", 2.0)], &mut source);
        bom("Y", "BOM_Y", &[("SHARED", 5.0)], &mut source);
        bom("SHARED", "BOM_S", &[("LEAF", 1.0)], &mut source);
        let tables = BomTables::new(source);
        let engine = ExplosionEngine::new(&tables, ExplosionOptions::new(d(2021, 1, 1), false));

        let outcome = engine.explode_root(&root_mapping(&tables, "ROOT"));
        let leaf_qty: Vec<f64> = outcome
            .leaves
            .iter()
            .filter(|l| l.component == "LEAF" && l.kind == RecordKind::Component)
            .map(|l| l.total_quantity)
            .collect();
        assert_eq!(leaf_qty, vec![2.0, 5.0]);
        assert!(outcome.truncated_paths.is_empty());
    }

    #[test]
    fn test_deleted_component_not_descended_unless_requested() {
        let mut source = SourceTables::default();
        bom("MAT001", "BOM001", &[], &mut source);
        bom("MAT002", "BOM002", &[("MAT009", 7.0)], &mut source);
        source.tracked_components.push(ChangeTrackedComponent {
            bom_number: "BOM001".to_string(),
            alternative: "01".to_string(),
            position: "0010".to_string(),
            component: "MAT002".to_string(),
            old_quantity: Some(2.0),
            new_quantity: Some(0.0),
            deletion_marker: false,
        });
        let tables = BomTables::new(source);
        let mapping = root_mapping(&tables, "MAT001");

        let active = ExplosionEngine::new(&tables, ExplosionOptions::new(d(2021, 1, 1), false))
            .explode_root(&mapping);
        assert_eq!(active.leaves.len(), 1);
        assert!(active.leaves[0].deleted);
        assert_eq!(active.leaves[0].alt_qty, Some(2.0));

        let all = ExplosionEngine::new(&tables, ExplosionOptions::new(d(2021, 1, 1), true))
            .explode_root(&mapping);
        assert!(all.leaves.iter().any(|l| l.component == "MAT009"));
    }

    #[test]
    fn test_child_alternative_policy() {
        let mut source = SourceTables::default();
        bom("MAT001", "BOM001", &[("MAT002", 2.0)], &mut source);
        // MAT002 只有替代 02
        source.mappings.push(MasterMapping {
            material: "MAT002".to_string(),
            plant: "PL01".to_string(),
            bom_number: "BOM002".to_string(),
            alternative: "02".to_string(),
        });
        source.headers.push(BomHeader {
            material: "MAT002".to_string(),
            plant: "PL01".to_string(),
            bom_number: "BOM002".to_string(),
            alternative: "02".to_string(),
            bom_usage: "1".to_string(),
            valid_from: d(2020, 1, 1),
            base_quantity: 1.0,
        });
        source.plain_components.push(PlainComponent {
            bom_number: "BOM002".to_string(),
            position: "0010".to_string(),
            component: "MAT004".to_string(),
            quantity: 3.0,
            valid_from: d(2020, 1, 1),
        });
        let tables = BomTables::new(source);
        let mapping = root_mapping(&tables, "MAT001");

        let inherit = ExplosionEngine::new(&tables, ExplosionOptions::new(d(2021, 1, 1), false))
            .explode_root(&mapping);
        assert!(!inherit.leaves.iter().any(|l| l.component == "MAT004"));

        let mut options = ExplosionOptions::new(d(2021, 1, 1), false);
        options.child_alternative_policy = ChildAlternativePolicy::Preferred;
        let preferred = ExplosionEngine::new(&tables, options).explode_root(&mapping);
        let mat004 = preferred
            .leaves
            .iter()
            .find(|l| l.component == "MAT004")
            .unwrap();
        assert_eq!(mat004.total_quantity, 6.0);
    }
}
