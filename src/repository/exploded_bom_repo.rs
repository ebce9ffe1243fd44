// ==========================================
// 多级 BOM 展开引擎 - 展开结果仓储 (SQLite)
// ==========================================
// 表: exploded_bom（每次运行整体替换）
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{ExplodedLeaf, RecordKind};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::LeafSink;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ExplodedBomRepository - 展开结果仓储
// ==========================================
pub struct ExplodedBomRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ExplodedBomRepository {
    /// 打开数据库并确保结果表存在
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_schema()?;
        Ok(repo)
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_schema()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS exploded_bom (
                seq_no          INTEGER PRIMARY KEY,
                run_id          TEXT,
                root_material   TEXT NOT NULL,
                material        TEXT NOT NULL,
                bom             TEXT,
                component       TEXT NOT NULL,
                level           INTEGER NOT NULL,
                total_quantity  REAL NOT NULL,
                deleted         INTEGER NOT NULL,
                alt_qty         REAL,
                new_qty         REAL,
                WERKS           TEXT NOT NULL,
                STLAL           TEXT NOT NULL,
                change_number   TEXT,
                kind            TEXT NOT NULL,
                total_cost      REAL
            );
            "#,
        )?;
        Ok(())
    }

    /// 整体替换结果表（单事务）
    ///
    /// # 返回
    /// - 写入行数
    pub fn replace_all(&self, run_id: Option<&str>, leaves: &[ExplodedLeaf]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute("DELETE FROM exploded_bom", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO exploded_bom (
                    seq_no, run_id, root_material, material, bom, component, level,
                    total_quantity, deleted, alt_qty, new_qty, WERKS, STLAL,
                    change_number, kind, total_cost
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                "#,
            )?;

            for (seq_no, leaf) in leaves.iter().enumerate() {
                stmt.execute(params![
                    seq_no as i64,
                    run_id,
                    leaf.root_material,
                    leaf.parent_material,
                    leaf.bom,
                    leaf.component,
                    leaf.level,
                    leaf.total_quantity,
                    leaf.deleted,
                    leaf.alt_qty,
                    leaf.new_qty,
                    leaf.plant,
                    leaf.alternative,
                    leaf.change_number,
                    leaf.kind.to_db_str(),
                    leaf.total_cost,
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(leaves.len())
    }

    /// 按写入顺序读取全部结果
    pub fn list_all(&self) -> RepositoryResult<Vec<ExplodedLeaf>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT root_material, material, bom, component, level, total_quantity, deleted,
                   alt_qty, new_qty, WERKS, STLAL, change_number, kind, total_cost
            FROM exploded_bom
            ORDER BY seq_no
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ExplodedLeaf {
                root_material: row.get(0)?,
                parent_material: row.get(1)?,
                bom: row.get(2)?,
                component: row.get(3)?,
                level: row.get(4)?,
                total_quantity: row.get(5)?,
                deleted: row.get(6)?,
                alt_qty: row.get(7)?,
                new_qty: row.get(8)?,
                plant: row.get(9)?,
                alternative: row.get(10)?,
                change_number: row.get(11)?,
                kind: RecordKind::from_str(&row.get::<_, String>(12)?),
                total_cost: row.get(13)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM exploded_bom", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl LeafSink for ExplodedBomRepository {
    fn write_leaves(&self, leaves: &[ExplodedLeaf]) -> RepositoryResult<usize> {
        self.replace_all(None, leaves)
    }

    fn write_run(&self, run_id: &str, leaves: &[ExplodedLeaf]) -> RepositoryResult<usize> {
        self.replace_all(Some(run_id), leaves)
    }

    fn describe(&self) -> String {
        "sqlite:exploded_bom".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn leaf(component: &str, kind: RecordKind, cost: Option<f64>) -> ExplodedLeaf {
        ExplodedLeaf {
            root_material: "MAT001".to_string(),
            plant: "PL01".to_string(),
            alternative: "01".to_string(),
            parent_material: "MAT001".to_string(),
            bom: Some("BOM001".to_string()),
            change_number: Some("ECN-1".to_string()),
            component: component.to_string(),
            level: 1,
            kind,
            total_quantity: 2.0,
            deleted: false,
            alt_qty: None,
            new_qty: Some(2.0),
            total_cost: cost,
        }
    }

    #[test]
    fn test_replace_and_list_preserves_order_and_nulls() {
        let temp_file = NamedTempFile::new().unwrap();
        let repo = ExplodedBomRepository::new(temp_file.path().to_str().unwrap()).unwrap();

        let leaves = vec![
            leaf("MAT002", RecordKind::Component, Some(4.0)),
            leaf("MAT002", RecordKind::Terminal, None),
        ];
        assert_eq!(repo.write_run("run-1", &leaves).unwrap(), 2);

        let stored = repo.list_all().unwrap();
        assert_eq!(stored, leaves);
    }

    #[test]
    fn test_replace_all_overwrites_previous_run() {
        let temp_file = NamedTempFile::new().unwrap();
        let repo = ExplodedBomRepository::new(temp_file.path().to_str().unwrap()).unwrap();

        repo.write_leaves(&[leaf("A", RecordKind::Component, None), leaf("B", RecordKind::Component, None)])
            .unwrap();
        repo.write_leaves(&[leaf("C", RecordKind::Component, None)]).unwrap();

        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.list_all().unwrap()[0].component, "C");
    }
}
