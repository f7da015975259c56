// ==========================================
// 制造工单生命周期引擎 - 引擎层错误类型
// ==========================================
// 分类: 校验拒绝 / 非法流转 / 前置条件 / 并发拒绝 / 远端失败
// 说明: ConsistencyWarning 不是错误，见 GenerationOutcome
// ==========================================

use thiserror::Error;

use crate::domain::types::{GenerationKind, OrderStatus};
use crate::engine::guard_rail::GuardRailDenial;
use crate::repository::error::RepositoryError;

/// 远端生成过程调用失败
///
/// message 原样透传给用户，不做改写
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteCallError {
    /// 远端过程名（generate_bom / generate_cut_list）
    pub procedure: String,
    /// 远端返回的错误信息
    pub message: String,
}

impl RemoteCallError {
    pub fn new(procedure: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            procedure: procedure.into(),
            message: message.into(),
        }
    }
}

/// 生命周期引擎错误
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// 防呆校验拒绝（不发生任何写入）
    #[error("{0}")]
    Validation(GuardRailDenial),

    /// 跳级、回退或离开终态
    #[error("非法状态流转: {from} → {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// 生成类型与工单状态不匹配（调用方错误，不重试）
    #[error("工单状态不满足生成前置条件: kind={kind}, status={status}")]
    Precondition {
        kind: GenerationKind,
        status: OrderStatus,
    },

    /// 同一 (工单, 类型) 已有生成在途
    #[error("generation already in progress: order_id={order_id}, kind={kind}")]
    ConcurrencyRejection {
        order_id: String,
        kind: GenerationKind,
    },

    /// 远端调用失败
    #[error("{0}")]
    Remote(RemoteCallError),

    #[error("工单不存在: {0}")]
    OrderNotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LifecycleError {
    /// 是否为同步判定的拒绝（调用方不应自动重试）
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LifecycleError::Validation(_)
                | LifecycleError::InvalidTransition { .. }
                | LifecycleError::Precondition { .. }
                | LifecycleError::ConcurrencyRejection { .. }
        )
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
