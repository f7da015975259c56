// ==========================================
// 制造工单生命周期引擎 - 销售订单行仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::bom::SaleOrderLine;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{format_datetime, int_to_bool, parse_datetime_col};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// SaleOrderLineRepository - 销售订单行仓储
// ==========================================
pub struct SaleOrderLineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SaleOrderLineRepository {
    /// 创建新的 SaleOrderLineRepository 实例
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

    /// 新建销售订单行
    pub fn insert(&self, line: &SaleOrderLine) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO sale_order_line (
                line_id, tenant_id, sale_order_id, line_no,
                product_name, quantity, is_deleted, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                line.line_id,
                line.tenant_id,
                line.sale_order_id,
                line.line_no,
                line.product_name,
                line.quantity,
                line.is_deleted as i32,
                format_datetime(line.created_at),
            ],
        )?;
        Ok(())
    }

    /// 查询销售订单下的全部有效行
    ///
    /// # 参数
    /// - `tenant_id`: 租户ID
    /// - `sale_order_id`: 销售订单ID
    pub fn list_by_sale_order(
        &self,
        tenant_id: &str,
        sale_order_id: &str,
    ) -> RepositoryResult<Vec<SaleOrderLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT line_id, tenant_id, sale_order_id, line_no,
                   product_name, quantity, is_deleted, created_at
            FROM sale_order_line
            WHERE tenant_id = ?1 AND sale_order_id = ?2 AND is_deleted = 0
            ORDER BY line_no ASC, line_id ASC
            "#,
        )?;

        let lines = stmt
            .query_map(params![tenant_id, sale_order_id], map_line_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lines)
    }

    /// 软删除
    pub fn soft_delete(&self, tenant_id: &str, line_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE sale_order_line SET is_deleted = 1 WHERE tenant_id = ?1 AND line_id = ?2 AND is_deleted = 0",
            params![tenant_id, line_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "SaleOrderLine".to_string(),
                id: line_id.to_string(),
            });
        }
        Ok(())
    }
}

fn map_line_row(row: &Row<'_>) -> rusqlite::Result<SaleOrderLine> {
    Ok(SaleOrderLine {
        line_id: row.get(0)?,
        tenant_id: row.get(1)?,
        sale_order_id: row.get(2)?,
        line_no: row.get(3)?,
        product_name: row.get(4)?,
        quantity: row.get(5)?,
        is_deleted: int_to_bool(row.get(6)?),
        created_at: parse_datetime_col(7, &row.get::<_, String>(7)?)?,
    })
}
