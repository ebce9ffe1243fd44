// ==========================================
// 多级 BOM 展开引擎 - 源表加载器
// ==========================================
// 数据源: 目录（每表一个 CSV/Excel 文件）或 SQLite 数据库（同名表）
// 红线: 全部源表在展开前一次性加载
// 红线: 任一行解析失败则整体失败
// ==========================================

use crate::db::{open_sqlite_connection, table_exists};
use crate::domain::SourceTable;
use crate::engine::tables::SourceTables;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{normalize_header, RawRow, UniversalFileParser};
use rusqlite::types::ValueRef;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ==========================================
// TableSource Trait
// ==========================================
pub trait TableSource {
    /// 读取某张源表的原始行；表不存在时返回 Ok(None)
    fn read_raw(&self, table: SourceTable) -> ImportResult<Option<Vec<RawRow>>>;

    /// 数据源描述（用于日志）
    fn describe(&self) -> String;

    /// 加载全部源表并映射为领域实体
    fn load(&self) -> ImportResult<SourceTables> {
        let mut tables = SourceTables::default();

        for table in SourceTable::ALL {
            let rows = match self.read_raw(table)? {
                Some(rows) => rows,
                None if table.is_required() => {
                    return Err(ImportError::TableMissing(table.to_string()))
                }
                None => {
                    debug!(table = %table, "可选源表缺失，按空表处理");
                    continue;
                }
            };

            let mapper = FieldMapper::new(table);
            match table {
                SourceTable::Mast => {
                    tables.mappings = rows.iter().map(|r| mapper.map_mast(r)).collect::<ImportResult<_>>()?
                }
                SourceTable::Stko => {
                    tables.headers = rows.iter().map(|r| mapper.map_stko(r)).collect::<ImportResult<_>>()?
                }
                SourceTable::Stpo => {
                    tables.plain_components =
                        rows.iter().map(|r| mapper.map_stpo(r)).collect::<ImportResult<_>>()?
                }
                SourceTable::Stas => {
                    for row in &rows {
                        let stas = mapper.map_stas(row)?;
                        tables.tracked_components.extend(stas.component);
                        tables.priorities.extend(stas.priority);
                    }
                }
                SourceTable::Stzu => {
                    tables.changes = rows.iter().map(|r| mapper.map_stzu(r)).collect::<ImportResult<_>>()?
                }
                SourceTable::Mbew => {
                    tables.costs = rows.iter().map(|r| mapper.map_mbew(r)).collect::<ImportResult<_>>()?
                }
            }
            debug!(table = %table, rows = rows.len(), "源表已加载");
        }

        info!(
            source = %self.describe(),
            mast = tables.mappings.len(),
            stko = tables.headers.len(),
            stpo = tables.plain_components.len(),
            stas_components = tables.tracked_components.len(),
            stas_priorities = tables.priorities.len(),
            stzu = tables.changes.len(),
            mbew = tables.costs.len(),
            "源表加载完成"
        );
        Ok(tables)
    }
}

// ==========================================
// DirectoryTableSource - 目录数据源
// ==========================================
// 文件名: <SAP 表代码>.<csv|xlsx|xls>，如 STKO.csv
pub struct DirectoryTableSource {
    dir: PathBuf,
}

impl DirectoryTableSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// 查找表文件（扩展名按 csv → xlsx → xls 顺序，表名大小写不敏感）
    fn find_file(&self, table: SourceTable) -> Option<PathBuf> {
        UniversalFileParser::EXTENSIONS.iter().find_map(|ext| {
            [table.table_name().to_string(), table.table_name().to_lowercase()]
                .iter()
                .map(|stem| self.dir.join(format!("{}.{}", stem, ext)))
                .find(|p| p.is_file())
        })
    }
}

impl TableSource for DirectoryTableSource {
    fn read_raw(&self, table: SourceTable) -> ImportResult<Option<Vec<RawRow>>> {
        match self.find_file(table) {
            Some(path) => {
                debug!(table = %table, path = %path.display(), "读取源表文件");
                UniversalFileParser.parse(&path).map(Some)
            }
            None => Ok(None),
        }
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

// ==========================================
// SqliteTableSource - SQLite 数据源
// ==========================================
pub struct SqliteTableSource {
    db_path: String,
}

impl SqliteTableSource {
    pub fn new(db_path: &str) -> Self {
        Self {
            db_path: db_path.to_string(),
        }
    }
}

impl TableSource for SqliteTableSource {
    fn read_raw(&self, table: SourceTable) -> ImportResult<Option<Vec<RawRow>>> {
        let conn = open_sqlite_connection(&self.db_path)?;
        if !table_exists(&conn, table.table_name())? {
            return Ok(None);
        }

        // 表名来自固定枚举，非外部输入；rowid 保证源表顺序
        let sql = format!("SELECT * FROM {} ORDER BY rowid", table.table_name());
        let mut stmt = conn.prepare(&sql)?;
        let headers: Vec<String> = stmt.column_names().iter().map(|c| normalize_header(c)).collect();

        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        let mut row_number = 0;
        while let Some(row) = rows.next()? {
            row_number += 1;
            let mut values = HashMap::new();
            for (idx, header) in headers.iter().enumerate() {
                values.insert(header.clone(), value_to_string(row.get_ref(idx)?));
            }
            records.push(RawRow::new(row_number, values));
        }

        Ok(Some(records))
    }

    fn describe(&self) -> String {
        self.db_path.clone()
    }
}

fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).trim().to_string(),
        ValueRef::Blob(b) => String::from_utf8_lossy(b).trim().to_string(),
    }
}

/// 按路径选择数据源：目录 → DirectoryTableSource；.db/.sqlite/.sqlite3 → SqliteTableSource
pub fn open_source<P: AsRef<Path>>(path: P) -> ImportResult<Box<dyn TableSource>> {
    let path = path.as_ref();
    if path.is_dir() {
        return Ok(Box::new(DirectoryTableSource::new(path)));
    }
    if is_sqlite_path(path) {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        return Ok(Box::new(SqliteTableSource::new(&path.to_string_lossy())));
    }
    Err(ImportError::UnsupportedSource(path.display().to_string()))
}

/// 是否为 SQLite 数据库文件扩展名
pub fn is_sqlite_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_lowercase().as_str(), "db" | "sqlite" | "sqlite3"))
        .unwrap_or(false)
}
