// ==========================================
// 多级 BOM 展开引擎 - 导入层
// ==========================================
// 流程: 文件/数据库读取 → 原始行 → 字段映射与类型转换 → SourceTables
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod table_loader;

// 重导出
pub use error::{ImportError, ImportResult};
pub use field_mapper::{parse_date, FieldMapper, StasRow};
pub use file_parser::{CsvParser, ExcelParser, RawRow, TableParser, UniversalFileParser};
pub use table_loader::{
    is_sqlite_path, open_source, DirectoryTableSource, SqliteTableSource, TableSource,
};
