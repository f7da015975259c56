// ==========================================
// 制造工单生命周期引擎 - BOM 仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: bom_instance / bom_instance_line 读写
// 约束: IN 子句按块执行，避免超出 SQLite 变量上限
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::bom::{BomInstance, BomInstanceLine};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{
    build_in_clause, format_datetime, int_to_bool, parse_datetime_col, tenant_params,
    IN_CLAUSE_CHUNK_SIZE,
};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// BomRepository - BOM 仓储
// ==========================================
pub struct BomRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BomRepository {
    /// 创建新的 BomRepository 实例
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

    // ===== 写入（供生成流程/测试夹具使用） =====

    pub fn insert_instance(&self, instance: &BomInstance) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO bom_instance (
                bom_instance_id, tenant_id, sale_order_line_id, is_deleted, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                instance.bom_instance_id,
                instance.tenant_id,
                instance.sale_order_line_id,
                instance.is_deleted as i32,
                format_datetime(instance.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn insert_line(&self, line: &BomInstanceLine) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO bom_instance_line (
                line_id, tenant_id, bom_instance_id,
                part_role, component_sku, description,
                qty, uom, unit_cost_exw, total_cost_exw,
                is_deleted, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                line.line_id,
                line.tenant_id,
                line.bom_instance_id,
                line.part_role,
                line.component_sku,
                line.description,
                line.qty,
                line.uom,
                line.unit_cost_exw,
                line.total_cost_exw,
                line.is_deleted as i32,
                format_datetime(line.created_at),
            ],
        )?;
        Ok(())
    }

    // ===== 查询 =====

    /// 查询挂在给定销售订单行下的 BOM 实例
    pub fn list_instances_by_sale_order_lines(
        &self,
        tenant_id: &str,
        sale_order_line_ids: &[String],
    ) -> RepositoryResult<Vec<BomInstance>> {
        if sale_order_line_ids.is_empty() {
            return Ok(vec![]);
        }

        let conn = self.get_conn()?;
        let mut out = Vec::new();

        for chunk in sale_order_line_ids.chunks(IN_CLAUSE_CHUNK_SIZE) {
            let sql = format!(
                r#"
                SELECT bom_instance_id, tenant_id, sale_order_line_id, is_deleted, created_at
                FROM bom_instance
                WHERE tenant_id = ? AND is_deleted = 0 AND {}
                ORDER BY created_at ASC, rowid ASC
                "#,
                build_in_clause("sale_order_line_id", chunk)
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(tenant_params(tenant_id, chunk).iter()), map_instance_row)?
                .collect::<Result<Vec<_>, _>>()?;
            out.extend(rows);
        }

        Ok(out)
    }

    /// 是否存在至少一条有效 BOM 明细（存在性检查，不做全量读取）
    pub fn exists_line(
        &self,
        tenant_id: &str,
        bom_instance_ids: &[String],
    ) -> RepositoryResult<bool> {
        if bom_instance_ids.is_empty() {
            return Ok(false);
        }

        let conn = self.get_conn()?;

        for chunk in bom_instance_ids.chunks(IN_CLAUSE_CHUNK_SIZE) {
            let sql = format!(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM bom_instance_line
                    WHERE tenant_id = ? AND is_deleted = 0 AND {}
                    LIMIT 1
                )
                "#,
                build_in_clause("bom_instance_id", chunk)
            );

            let found: i64 = conn.query_row(
                &sql,
                params_from_iter(tenant_params(tenant_id, chunk).iter()),
                |row| row.get(0),
            )?;
            if found != 0 {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// 查询 BOM 明细
    pub fn list_lines(
        &self,
        tenant_id: &str,
        bom_instance_ids: &[String],
    ) -> RepositoryResult<Vec<BomInstanceLine>> {
        if bom_instance_ids.is_empty() {
            return Ok(vec![]);
        }

        let conn = self.get_conn()?;
        let mut out = Vec::new();

        for chunk in bom_instance_ids.chunks(IN_CLAUSE_CHUNK_SIZE) {
            let sql = format!(
                r#"
                SELECT line_id, tenant_id, bom_instance_id,
                       part_role, component_sku, description,
                       qty, uom, unit_cost_exw, total_cost_exw,
                       is_deleted, created_at
                FROM bom_instance_line
                WHERE tenant_id = ? AND is_deleted = 0 AND {}
                ORDER BY created_at ASC, rowid ASC
                "#,
                build_in_clause("bom_instance_id", chunk)
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(tenant_params(tenant_id, chunk).iter()), map_line_row)?
                .collect::<Result<Vec<_>, _>>()?;
            out.extend(rows);
        }

        Ok(out)
    }

    // ===== 软删除 =====

    pub fn soft_delete_line(&self, tenant_id: &str, line_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE bom_instance_line SET is_deleted = 1 WHERE tenant_id = ?1 AND line_id = ?2 AND is_deleted = 0",
            params![tenant_id, line_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "BomInstanceLine".to_string(),
                id: line_id.to_string(),
            });
        }
        Ok(())
    }

    /// 软删除 BOM 实例（不级联明细；明细经由实例过滤自然不可达）
    pub fn soft_delete_instance(&self, tenant_id: &str, bom_instance_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE bom_instance SET is_deleted = 1 WHERE tenant_id = ?1 AND bom_instance_id = ?2 AND is_deleted = 0",
            params![tenant_id, bom_instance_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "BomInstance".to_string(),
                id: bom_instance_id.to_string(),
            });
        }
        Ok(())
    }
}

fn map_instance_row(row: &Row<'_>) -> rusqlite::Result<BomInstance> {
    Ok(BomInstance {
        bom_instance_id: row.get(0)?,
        tenant_id: row.get(1)?,
        sale_order_line_id: row.get(2)?,
        is_deleted: int_to_bool(row.get(3)?),
        created_at: parse_datetime_col(4, &row.get::<_, String>(4)?)?,
    })
}

fn map_line_row(row: &Row<'_>) -> rusqlite::Result<BomInstanceLine> {
    Ok(BomInstanceLine {
        line_id: row.get(0)?,
        tenant_id: row.get(1)?,
        bom_instance_id: row.get(2)?,
        part_role: row.get(3)?,
        component_sku: row.get(4)?,
        description: row.get(5)?,
        qty: row.get(6)?,
        uom: row.get(7)?,
        unit_cost_exw: row.get(8)?,
        total_cost_exw: row.get(9)?,
        is_deleted: int_to_bool(row.get(10)?),
        created_at: parse_datetime_col(11, &row.get::<_, String>(11)?)?,
    })
}
