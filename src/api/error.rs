// ==========================================
// 制造工单生命周期引擎 - API层错误类型
// ==========================================
// 职责: 把仓储/引擎错误转换为面向用户的错误消息
// 约束: 所有错误信息必须包含显式原因
// ==========================================

use crate::domain::types::{GenerationKind, OrderStatus};
use crate::engine::error::LifecycleError;
use crate::engine::guard_rail::GuardRailDenial;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 授权与输入
    // ==========================================
    #[error("无操作权限: {0}")]
    Forbidden(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 生命周期规则
    // ==========================================
    /// 防呆校验拒绝，reason 原样展示
    #[error("{reason}")]
    GuardRailDenied {
        denial: GuardRailDenial,
        reason: String,
    },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: OrderStatus, to: OrderStatus },

    #[error("工单状态不满足生成前置条件: kind={kind}, status={status}")]
    GenerationPrecondition {
        kind: GenerationKind,
        status: OrderStatus,
    },

    #[error("generation already in progress: order_id={order_id}, kind={kind}")]
    GenerationInProgress {
        order_id: String,
        kind: GenerationKind,
    },

    /// 远端调用失败，message 原样透传
    #[error("{message}")]
    RemoteFailure { procedure: String, message: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InternalError(format!("库中字段{}取值异常: {}", field, message))
            }
        }
    }
}

// ==========================================
// 从 LifecycleError 转换
// ==========================================
impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation(denial) => ApiError::GuardRailDenied {
                denial,
                reason: denial.reason().to_string(),
            },
            LifecycleError::InvalidTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            LifecycleError::Precondition { kind, status } => {
                ApiError::GenerationPrecondition { kind, status }
            }
            LifecycleError::ConcurrencyRejection { order_id, kind } => {
                ApiError::GenerationInProgress { order_id, kind }
            }
            LifecycleError::Remote(e) => ApiError::RemoteFailure {
                procedure: e.procedure,
                message: e.message,
            },
            LifecycleError::OrderNotFound(id) => {
                ApiError::NotFound(format!("ManufacturingOrder(id={})不存在", id))
            }
            LifecycleError::Repository(e) => e.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
