// ==========================================
// 制造工单生命周期引擎 - 制造工单仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 实际开工/完工日期以 COALESCE 落库，只写一次
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::order::{ManufacturingOrder, OrderDetailsPatch, OrderStatusPatch};
use crate::domain::types::{OrderPriority, OrderStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{
    format_date, format_datetime, int_to_bool, parse_datetime_col, parse_optional_date,
};
use chrono::Utc;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const ORDER_COLUMNS: &str = r#"
    order_id, tenant_id, sale_order_id, order_no,
    status, priority,
    scheduled_start_date, scheduled_end_date,
    actual_start_date, actual_end_date,
    notes, is_deleted, created_at, updated_at
"#;

// ==========================================
// ManufacturingOrderRepository - 制造工单仓储
// ==========================================
/// 制造工单仓储
/// 职责: 管理 manufacturing_order 表；所有读取按租户过滤并排除软删除
pub struct ManufacturingOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ManufacturingOrderRepository {
    /// 创建新的 ManufacturingOrderRepository 实例
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建工单
    pub fn insert(&self, order: &ManufacturingOrder) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO manufacturing_order (
                order_id, tenant_id, sale_order_id, order_no,
                status, priority,
                scheduled_start_date, scheduled_end_date,
                actual_start_date, actual_end_date,
                notes, is_deleted, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                order.order_id,
                order.tenant_id,
                order.sale_order_id,
                order.order_no,
                order.status.to_db_str(),
                order.priority.to_db_str(),
                format_date(order.scheduled_start_date),
                format_date(order.scheduled_end_date),
                format_date(order.actual_start_date),
                format_date(order.actual_end_date),
                order.notes,
                order.is_deleted as i32,
                format_datetime(order.created_at),
                format_datetime(order.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 按主键查询（租户内、未删除）
    pub fn find_by_id(
        &self,
        tenant_id: &str,
        order_id: &str,
    ) -> RepositoryResult<Option<ManufacturingOrder>> {
        let conn = self.get_conn()?;
        Self::find_with_conn(&conn, tenant_id, order_id)
    }

    fn find_with_conn(
        conn: &Connection,
        tenant_id: &str,
        order_id: &str,
    ) -> RepositoryResult<Option<ManufacturingOrder>> {
        let sql = format!(
            "SELECT {} FROM manufacturing_order WHERE tenant_id = ?1 AND order_id = ?2 AND is_deleted = 0",
            ORDER_COLUMNS
        );
        let order = conn
            .query_row(&sql, params![tenant_id, order_id], map_order_row)
            .optional()?;
        Ok(order)
    }

    /// 列表查询，可按状态过滤
    ///
    /// 排序: 优先级（紧急在前）→ 计划开工（空值在后）→ 工单编号
    pub fn list_by_status(
        &self,
        tenant_id: &str,
        status: Option<OrderStatus>,
    ) -> RepositoryResult<Vec<ManufacturingOrder>> {
        let conn = self.get_conn()?;

        let mut sql = format!(
            "SELECT {} FROM manufacturing_order WHERE tenant_id = ? AND is_deleted = 0",
            ORDER_COLUMNS
        );
        let mut values: Vec<Value> = vec![Value::from(tenant_id.to_string())];

        if let Some(s) = status {
            sql.push_str(" AND status = ?");
            values.push(Value::from(s.to_db_str().to_string()));
        }

        sql.push_str(
            r#"
            ORDER BY
                CASE priority
                    WHEN 'urgent' THEN 0
                    WHEN 'high' THEN 1
                    WHEN 'normal' THEN 2
                    ELSE 3
                END,
                scheduled_start_date IS NULL,
                scheduled_start_date,
                order_no
            "#,
        );

        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params_from_iter(values.iter()), map_order_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(orders)
    }

    /// 状态变更落库
    ///
    /// - status 为 None 时保持原值
    /// - actual_start_date / actual_end_date 仅在库中为空时写入
    ///
    /// # 返回
    /// - Ok(ManufacturingOrder): 落库后的工单
    /// - Err(NotFound): 工单不存在或已软删除
    pub fn update_status(
        &self,
        tenant_id: &str,
        order_id: &str,
        patch: &OrderStatusPatch,
    ) -> RepositoryResult<ManufacturingOrder> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE manufacturing_order
            SET status = COALESCE(?3, status),
                actual_start_date = COALESCE(actual_start_date, ?4),
                actual_end_date = COALESCE(actual_end_date, ?5),
                updated_at = ?6
            WHERE tenant_id = ?1 AND order_id = ?2 AND is_deleted = 0
            "#,
            params![
                tenant_id,
                order_id,
                patch.status.map(|s| s.to_db_str()),
                format_date(patch.actual_start_date),
                format_date(patch.actual_end_date),
                format_datetime(Utc::now().naive_utc()),
            ],
        )?;

        if affected == 0 {
            return Err(not_found(order_id));
        }

        Self::find_with_conn(&conn, tenant_id, order_id)?.ok_or_else(|| not_found(order_id))
    }

    /// 非状态字段编辑（备注、优先级、计划日期）
    pub fn update_details(
        &self,
        tenant_id: &str,
        order_id: &str,
        patch: &OrderDetailsPatch,
    ) -> RepositoryResult<ManufacturingOrder> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE manufacturing_order
            SET notes = COALESCE(?3, notes),
                priority = COALESCE(?4, priority),
                scheduled_start_date = COALESCE(?5, scheduled_start_date),
                scheduled_end_date = COALESCE(?6, scheduled_end_date),
                updated_at = ?7
            WHERE tenant_id = ?1 AND order_id = ?2 AND is_deleted = 0
            "#,
            params![
                tenant_id,
                order_id,
                patch.notes,
                patch.priority.map(|p| p.to_db_str()),
                format_date(patch.scheduled_start_date),
                format_date(patch.scheduled_end_date),
                format_datetime(Utc::now().naive_utc()),
            ],
        )?;

        if affected == 0 {
            return Err(not_found(order_id));
        }

        Self::find_with_conn(&conn, tenant_id, order_id)?.ok_or_else(|| not_found(order_id))
    }

    /// 软删除（工单从不物理删除）
    pub fn soft_delete(&self, tenant_id: &str, order_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE manufacturing_order
            SET is_deleted = 1, updated_at = ?3
            WHERE tenant_id = ?1 AND order_id = ?2 AND is_deleted = 0
            "#,
            params![tenant_id, order_id, format_datetime(Utc::now().naive_utc())],
        )?;

        if affected == 0 {
            return Err(not_found(order_id));
        }
        Ok(())
    }
}

fn not_found(order_id: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "ManufacturingOrder".to_string(),
        id: order_id.to_string(),
    }
}

fn map_order_row(row: &Row<'_>) -> rusqlite::Result<ManufacturingOrder> {
    let status_raw: String = row.get(4)?;
    let status = OrderStatus::from_str(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            Box::new(RepositoryError::FieldValueError {
                field: "status".to_string(),
                message: format!("未知工单状态: {}", status_raw),
            }),
        )
    })?;

    Ok(ManufacturingOrder {
        order_id: row.get(0)?,
        tenant_id: row.get(1)?,
        sale_order_id: row.get(2)?,
        order_no: row.get(3)?,
        status,
        priority: OrderPriority::from_str(&row.get::<_, String>(5)?),
        scheduled_start_date: parse_optional_date(row.get(6)?),
        scheduled_end_date: parse_optional_date(row.get(7)?),
        actual_start_date: parse_optional_date(row.get(8)?),
        actual_end_date: parse_optional_date(row.get(9)?),
        notes: row.get(10)?,
        is_deleted: int_to_bool(row.get(11)?),
        created_at: parse_datetime_col(12, &row.get::<_, String>(12)?)?,
        updated_at: parse_datetime_col(13, &row.get::<_, String>(13)?)?,
    })
}
