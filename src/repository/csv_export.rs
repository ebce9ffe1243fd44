// ==========================================
// 多级 BOM 展开引擎 - CSV 结果导出
// ==========================================
// 列: 与 exploded_bom.csv 对齐（material/bom/component/level/total_quantity/
//     deleted/alt_qty/new_qty/WERKS/STLAL/total_cost），另加 root_material/change_number/kind
// 空值写为空单元格
// ==========================================

use crate::domain::ExplodedLeaf;
use crate::repository::error::RepositoryResult;
use crate::repository::LeafSink;
use csv::WriterBuilder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const CSV_COLUMNS: [&str; 14] = [
    "root_material",
    "material",
    "bom",
    "component",
    "level",
    "total_quantity",
    "deleted",
    "alt_qty",
    "new_qty",
    "WERKS",
    "STLAL",
    "change_number",
    "kind",
    "total_cost",
];

pub struct CsvLeafWriter {
    path: PathBuf,
}

impl CsvLeafWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LeafSink for CsvLeafWriter {
    fn write_leaves(&self, leaves: &[ExplodedLeaf]) -> RepositoryResult<usize> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(CSV_COLUMNS)?;

        for leaf in leaves {
            writer.write_record(&[
                leaf.root_material.clone(),
                leaf.parent_material.clone(),
                leaf.bom.clone().unwrap_or_default(),
                leaf.component.clone(),
                leaf.level.to_string(),
                leaf.total_quantity.to_string(),
                leaf.deleted.to_string(),
                opt_f64(leaf.alt_qty),
                opt_f64(leaf.new_qty),
                leaf.plant.clone(),
                leaf.alternative.clone(),
                leaf.change_number.clone().unwrap_or_default(),
                leaf.kind.to_db_str().to_string(),
                opt_f64(leaf.total_cost),
            ])?;
        }
        writer.flush()?;

        Ok(leaves.len())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn opt_f64(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordKind;
    use tempfile::TempDir;

    #[test]
    fn test_writes_header_and_empty_cells_for_missing_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("exploded_bom.csv");
        let leaf = ExplodedLeaf {
            root_material: "MAT001".to_string(),
            plant: "PL01".to_string(),
            alternative: "01".to_string(),
            parent_material: "MAT002".to_string(),
            bom: Some("BOM002".to_string()),
            change_number: None,
            component: "MAT005".to_string(),
            level: 2,
            kind: RecordKind::Component,
            total_quantity: 6.0,
            deleted: false,
            alt_qty: None,
            new_qty: Some(3.0),
            total_cost: None,
        };

        let written = CsvLeafWriter::new(&path).write_leaves(&[leaf]).unwrap();
        assert_eq!(written, 1);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], CSV_COLUMNS.join(","));
        assert_eq!(lines[1], "MAT001,MAT002,BOM002,MAT005,2,6,false,,3,PL01,01,,COMPONENT,");
    }
}
