// ==========================================
// 多级 BOM 展开引擎 - 结果输出层
// ==========================================
// 职责: 持久化展开结果（CSV 文件 / SQLite 表）
// 红线: Repository 不含业务逻辑
// ==========================================

pub mod csv_export;
pub mod error;
pub mod exploded_bom_repo;

use crate::domain::ExplodedLeaf;
use crate::importer::is_sqlite_path;
use std::path::Path;

// 重导出
pub use csv_export::{CsvLeafWriter, CSV_COLUMNS};
pub use error::{RepositoryError, RepositoryResult};
pub use exploded_bom_repo::ExplodedBomRepository;

// ==========================================
// LeafSink Trait - 展开结果写出接口
// ==========================================
pub trait LeafSink {
    /// 写出全部展开记录，返回写入行数
    fn write_leaves(&self, leaves: &[ExplodedLeaf]) -> RepositoryResult<usize>;

    /// 带运行 ID 写出（默认忽略运行 ID）
    fn write_run(&self, _run_id: &str, leaves: &[ExplodedLeaf]) -> RepositoryResult<usize> {
        self.write_leaves(leaves)
    }

    fn describe(&self) -> String;
}

/// 按扩展名选择输出：.csv → CsvLeafWriter；.db/.sqlite/.sqlite3 → ExplodedBomRepository
pub fn open_sink<P: AsRef<Path>>(path: P) -> RepositoryResult<Box<dyn LeafSink>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if ext == "csv" {
        return Ok(Box::new(CsvLeafWriter::new(path)));
    }
    if is_sqlite_path(path) {
        return Ok(Box::new(ExplodedBomRepository::new(&path.to_string_lossy())?));
    }
    Err(RepositoryError::UnsupportedSink(path.display().to_string()))
}
