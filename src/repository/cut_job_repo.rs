// ==========================================
// 制造工单生命周期引擎 - 下料单仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: cut_job / cut_job_line 读写
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::cut_list::{CutJob, CutJobLine};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{format_datetime, int_to_bool, parse_datetime_col};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// CutJobRepository - 下料单仓储
// ==========================================
pub struct CutJobRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CutJobRepository {
    /// 创建新的 CutJobRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert_job(&self, job: &CutJob) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO cut_job (cut_job_id, tenant_id, order_id, status, is_deleted, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                job.cut_job_id,
                job.tenant_id,
                job.order_id,
                job.status,
                job.is_deleted as i32,
                format_datetime(job.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn insert_line(&self, line: &CutJobLine) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO cut_job_line (
                line_id, tenant_id, cut_job_id, sale_order_line_id,
                part_role, description, cut_length_mm, quantity, uom,
                is_deleted, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                line.line_id,
                line.tenant_id,
                line.cut_job_id,
                line.sale_order_line_id,
                line.part_role,
                line.description,
                line.cut_length_mm,
                line.quantity,
                line.uom,
                line.is_deleted as i32,
                format_datetime(line.created_at),
            ],
        )?;
        Ok(())
    }

    /// 查询工单最新的有效下料任务
    ///
    /// 重新生成会替换旧任务，因此只取最新一条
    pub fn find_latest_by_order(
        &self,
        tenant_id: &str,
        order_id: &str,
    ) -> RepositoryResult<Option<CutJob>> {
        let conn = self.get_conn()?;
        let job = conn
            .query_row(
                r#"
                SELECT cut_job_id, tenant_id, order_id, status, is_deleted, created_at
                FROM cut_job
                WHERE tenant_id = ?1 AND order_id = ?2 AND is_deleted = 0
                ORDER BY created_at DESC, rowid DESC
                LIMIT 1
                "#,
                params![tenant_id, order_id],
                map_job_row,
            )
            .optional()?;
        Ok(job)
    }

    /// 查询下料明细
    pub fn list_lines(&self, tenant_id: &str, cut_job_id: &str) -> RepositoryResult<Vec<CutJobLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT line_id, tenant_id, cut_job_id, sale_order_line_id,
                   part_role, description, cut_length_mm, quantity, uom,
                   is_deleted, created_at
            FROM cut_job_line
            WHERE tenant_id = ?1 AND cut_job_id = ?2 AND is_deleted = 0
            ORDER BY created_at ASC, rowid ASC
            "#,
        )?;

        let lines = stmt
            .query_map(params![tenant_id, cut_job_id], map_line_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lines)
    }

    pub fn soft_delete_job(&self, tenant_id: &str, cut_job_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE cut_job SET is_deleted = 1 WHERE tenant_id = ?1 AND cut_job_id = ?2 AND is_deleted = 0",
            params![tenant_id, cut_job_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "CutJob".to_string(),
                id: cut_job_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn soft_delete_line(&self, tenant_id: &str, line_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE cut_job_line SET is_deleted = 1 WHERE tenant_id = ?1 AND line_id = ?2 AND is_deleted = 0",
            params![tenant_id, line_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "CutJobLine".to_string(),
                id: line_id.to_string(),
            });
        }
        Ok(())
    }
}

fn map_job_row(row: &Row<'_>) -> rusqlite::Result<CutJob> {
    Ok(CutJob {
        cut_job_id: row.get(0)?,
        tenant_id: row.get(1)?,
        order_id: row.get(2)?,
        status: row.get(3)?,
        is_deleted: int_to_bool(row.get(4)?),
        created_at: parse_datetime_col(5, &row.get::<_, String>(5)?)?,
    })
}

fn map_line_row(row: &Row<'_>) -> rusqlite::Result<CutJobLine> {
    Ok(CutJobLine {
        line_id: row.get(0)?,
        tenant_id: row.get(1)?,
        cut_job_id: row.get(2)?,
        sale_order_line_id: row.get(3)?,
        part_role: row.get(4)?,
        description: row.get(5)?,
        cut_length_mm: row.get(6)?,
        quantity: row.get(7)?,
        uom: row.get(8)?,
        is_deleted: int_to_bool(row.get(9)?),
        created_at: parse_datetime_col(10, &row.get::<_, String>(10)?)?,
    })
}
