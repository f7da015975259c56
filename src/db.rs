// ==========================================
// 制造工单生命周期引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 提供建表脚本，测试库与演示库共用同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）
///
/// 所有业务表均带 tenant_id 与 is_deleted，读取时统一按租户过滤并排除软删除行。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS manufacturing_order (
            order_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            sale_order_id TEXT NOT NULL,
            order_no TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'draft',
            priority TEXT NOT NULL DEFAULT 'normal',
            scheduled_start_date TEXT,
            scheduled_end_date TEXT,
            actual_start_date TEXT,
            actual_end_date TEXT,
            notes TEXT,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_mo_tenant_status
          ON manufacturing_order(tenant_id, status);

        CREATE TABLE IF NOT EXISTS sale_order_line (
            line_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            sale_order_id TEXT NOT NULL,
            line_no INTEGER NOT NULL,
            product_name TEXT NOT NULL,
            quantity REAL NOT NULL DEFAULT 0,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sol_tenant_so
          ON sale_order_line(tenant_id, sale_order_id);

        CREATE TABLE IF NOT EXISTS bom_instance (
            bom_instance_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            sale_order_line_id TEXT NOT NULL REFERENCES sale_order_line(line_id),
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_bom_instance_line_ref
          ON bom_instance(tenant_id, sale_order_line_id);

        CREATE TABLE IF NOT EXISTS bom_instance_line (
            line_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            bom_instance_id TEXT NOT NULL REFERENCES bom_instance(bom_instance_id),
            part_role TEXT,
            component_sku TEXT,
            description TEXT NOT NULL DEFAULT '',
            qty REAL NOT NULL DEFAULT 0,
            uom TEXT NOT NULL DEFAULT 'ea',
            unit_cost_exw REAL,
            total_cost_exw REAL,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_bom_line_instance
          ON bom_instance_line(tenant_id, bom_instance_id);

        CREATE TABLE IF NOT EXISTS cut_job (
            cut_job_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            order_id TEXT NOT NULL REFERENCES manufacturing_order(order_id),
            status TEXT NOT NULL DEFAULT 'open',
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cut_job_order
          ON cut_job(tenant_id, order_id);

        CREATE TABLE IF NOT EXISTS cut_job_line (
            line_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            cut_job_id TEXT NOT NULL REFERENCES cut_job(cut_job_id),
            sale_order_line_id TEXT,
            part_role TEXT,
            description TEXT NOT NULL DEFAULT '',
            cut_length_mm REAL NOT NULL DEFAULT 0,
            quantity INTEGER NOT NULL DEFAULT 1,
            uom TEXT NOT NULL DEFAULT 'mm',
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cut_job_line_job
          ON cut_job_line(tenant_id, cut_job_id);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
