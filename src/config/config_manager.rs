// ==========================================
// 制造工单生命周期引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::lifecycle_config_trait::LifecycleConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// 补偿等待默认值（毫秒）
pub const DEFAULT_COMPENSATION_DELAY_MS: u64 = 2_000;

/// BOM 物料默认类别顺序
pub const DEFAULT_MATERIALS_PRECEDENCE: [&str; 8] = [
    "fabric",
    "tube",
    "motor",
    "bracket",
    "cassette",
    "side_channel",
    "bottom_channel",
    "accessory",
];

/// 下料单默认类别顺序
pub const DEFAULT_CUT_LIST_PRECEDENCE: [&str; 8] = [
    "fabric",
    "tube",
    "bottom_bar",
    "side_channel",
    "bottom_channel",
    "cassette",
    "bracket",
    "accessory",
];

pub const DEFAULT_TENANT_ID: &str = "default";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取 JSON 字符串数组配置；缺失或格式错误时回退默认
    fn get_precedence(&self, key: &str, default: &[&str]) -> ConfigResult<Vec<String>> {
        let fallback = || default.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(fallback()),
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(list) => {
                let list: Vec<String> = list
                    .into_iter()
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect();
                if list.is_empty() {
                    Ok(fallback())
                } else {
                    Ok(list)
                }
            }
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    "类别顺序配置格式错误，使用默认顺序"
                );
                Ok(fallback())
            }
        }
    }
}

// ==========================================
// LifecycleConfigReader Trait 实现
// ==========================================
#[async_trait]
impl LifecycleConfigReader for ConfigManager {
    async fn get_compensation_delay_ms(&self) -> ConfigResult<u64> {
        let default = DEFAULT_COMPENSATION_DELAY_MS.to_string();
        let value = self.get_config_or_default(config_keys::COMPENSATION_DELAY_MS, &default)?;
        match value.trim().parse::<u64>() {
            Ok(ms) => Ok(ms),
            Err(_) => {
                tracing::warn!(
                    config_key = config_keys::COMPENSATION_DELAY_MS,
                    raw_value = %value,
                    "补偿等待配置格式错误，使用默认值"
                );
                Ok(DEFAULT_COMPENSATION_DELAY_MS)
            }
        }
    }

    async fn get_materials_category_precedence(&self) -> ConfigResult<Vec<String>> {
        self.get_precedence(
            config_keys::MATERIALS_CATEGORY_PRECEDENCE,
            &DEFAULT_MATERIALS_PRECEDENCE,
        )
    }

    async fn get_cut_list_category_precedence(&self) -> ConfigResult<Vec<String>> {
        self.get_precedence(
            config_keys::CUT_LIST_CATEGORY_PRECEDENCE,
            &DEFAULT_CUT_LIST_PRECEDENCE,
        )
    }

    async fn get_default_tenant_id(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(config_keys::DEFAULT_TENANT_ID, DEFAULT_TENANT_ID)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok(DEFAULT_TENANT_ID.to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 派生数据生成
    pub const COMPENSATION_DELAY_MS: &str = "lifecycle/compensation_delay_ms";

    // 汇总展示
    pub const MATERIALS_CATEGORY_PRECEDENCE: &str = "lifecycle/materials_category_precedence";
    pub const CUT_LIST_CATEGORY_PRECEDENCE: &str = "lifecycle/cut_list_category_precedence";

    // 租户
    pub const DEFAULT_TENANT_ID: &str = "lifecycle/default_tenant_id";
}
