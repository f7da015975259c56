// ==========================================
// 制造工单生命周期引擎 - 仓储层错误类型
// ==========================================
// 约束: SQLite 约束错误在此归类，上层不解析错误文本
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 记录不存在、已软删除或不属于该租户
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    /// 共享连接的 Mutex 被毒化
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    /// 例如 BOM 实例引用了不存在的销售订单行
    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    /// 库中存放了无法识别的枚举值或日期
    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                RepositoryError::UniqueConstraintViolation(msg)
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("FOREIGN KEY") => {
                RepositoryError::ForeignKeyViolation(msg)
            }
            // 行映射时包装进去的字段错误原样取回
            rusqlite::Error::FromSqlConversionFailure(idx, ty, inner) => {
                match inner.downcast::<RepositoryError>() {
                    Ok(e) => *e,
                    Err(inner) => RepositoryError::DatabaseQueryError(
                        rusqlite::Error::FromSqlConversionFailure(idx, ty, inner).to_string(),
                    ),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
