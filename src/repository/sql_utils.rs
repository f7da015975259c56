// ==========================================
// 制造工单生命周期引擎 - 仓储层 SQL 工具
// ==========================================
// 职责: IN 子句构建、日期/布尔列转换
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{Type, Value};

/// SQLite 默认变量上限通常为 999；留出余量（另有租户参数）。
pub const IN_CLAUSE_CHUNK_SIZE: usize = 900;

/// 日期列存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 时间戳列存储格式
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 构建 IN 子句的 SQL 片段
///
/// ```
/// use mo_lifecycle::repository::sql_utils::build_in_clause;
///
/// let ids = vec!["a".to_string(), "b".to_string()];
/// assert_eq!(build_in_clause("line_id", &ids), "line_id IN (?, ?)");
///
/// let empty: Vec<String> = vec![];
/// assert_eq!(build_in_clause("line_id", &empty), "1 = 0");
/// ```
pub fn build_in_clause<T: AsRef<str>>(column_name: &str, values: &[T]) -> String {
    if values.is_empty() {
        // 空列表时返回永假条件，确保 SQL 语法正确
        return "1 = 0".to_string();
    }

    let placeholders = values.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
    format!("{} IN ({})", column_name, placeholders)
}

/// 租户参数在前，IN 列表参数在后
pub fn tenant_params(tenant_id: &str, ids: &[String]) -> Vec<Value> {
    let mut values: Vec<Value> = Vec::with_capacity(ids.len() + 1);
    values.push(Value::from(tenant_id.to_string()));
    values.extend(ids.iter().map(|id| Value::from(id.clone())));
    values
}

/// 读取必填日期时间列
pub fn parse_datetime_col(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// 读取可空日期列（格式非法按空处理）
pub fn parse_optional_date(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok())
}

pub fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

pub fn format_datetime(ts: NaiveDateTime) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}

/// INTEGER(0/1) → bool
pub fn int_to_bool(v: i64) -> bool {
    v != 0
}
