// ==========================================
// 制造工单生命周期引擎 - 派生数据生成编排
// ==========================================
// 流程: 获取在途锁 → 前置条件 → 远端生成 → 补偿等待
//       → 重新读取校验 → 释放锁 → 通知
// 红线: 锁在所有退出路径释放（守卫 Drop）
// 红线: 远端失败原样透传，不自动重试
// 说明: 远端已确认但校验读取为空 → ConsistencyWarning（软成功）
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::order::ManufacturingOrder;
use crate::domain::types::GenerationKind;
use crate::engine::compensation::ConsistencyCompensation;
use crate::engine::error::{LifecycleError, LifecycleResult};
use crate::engine::events::{EventLevel, EventTopic, LifecycleEvent, OptionalNotificationSink};
use crate::engine::generation_lock::GenerationLockRegistry;
use crate::engine::remote::{self, RemoteGenerator};
use crate::engine::repositories::{load_bom_lines, load_cut_job_lines, OrderStore};
use crate::repository::RepositoryResult;

/// 生成结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// 校验读取到派生行
    Completed { kind: GenerationKind, rows: usize },
    /// 远端已确认但派生行尚不可见，提示用户刷新/重试
    ConsistencyWarning { kind: GenerationKind, message: String },
}

impl GenerationOutcome {
    pub fn kind(&self) -> GenerationKind {
        match self {
            GenerationOutcome::Completed { kind, .. } => *kind,
            GenerationOutcome::ConsistencyWarning { kind, .. } => *kind,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, GenerationOutcome::ConsistencyWarning { .. })
    }
}

// ==========================================
// GenerationOrchestrator
// ==========================================
pub struct GenerationOrchestrator {
    store: Arc<dyn OrderStore>,
    remote: Arc<dyn RemoteGenerator>,
    compensation: Arc<dyn ConsistencyCompensation>,
    locks: Arc<GenerationLockRegistry>,
    sink: OptionalNotificationSink,
}

impl GenerationOrchestrator {
    pub fn new(
        store: Arc<dyn OrderStore>,
        remote: Arc<dyn RemoteGenerator>,
        compensation: Arc<dyn ConsistencyCompensation>,
        locks: Arc<GenerationLockRegistry>,
        sink: OptionalNotificationSink,
    ) -> Self {
        Self {
            store,
            remote,
            compensation,
            locks,
            sink,
        }
    }

    pub fn locks(&self) -> &Arc<GenerationLockRegistry> {
        &self.locks
    }

    /// 执行一次生成
    ///
    /// # 返回
    /// - Ok(Completed / ConsistencyWarning)
    /// - Err(ConcurrencyRejection): 同键已有生成在途
    /// - Err(Precondition): 工单状态与生成类型不匹配
    /// - Err(Remote): 远端调用失败
    pub async fn generate(
        &self,
        order: &ManufacturingOrder,
        kind: GenerationKind,
    ) -> LifecycleResult<GenerationOutcome> {
        let order_id = order.order_id.as_str();
        let topic = EventTopic::for_generation(kind);

        let Some(lock) = self.locks.try_acquire(order_id, kind) else {
            let err = LifecycleError::ConcurrencyRejection {
                order_id: order_id.to_string(),
                kind,
            };
            tracing::warn!(order_id, kind = %kind, "生成在途，拒绝重复请求");
            self.sink.emit(LifecycleEvent::new(
                order_id,
                topic,
                EventLevel::Rejection,
                err.to_string(),
            ));
            return Err(err);
        };

        let result = self.run_locked(order, kind).await;
        drop(lock);

        match &result {
            Ok(GenerationOutcome::Completed { rows, .. }) => {
                tracing::info!(order_id, kind = %kind, rows, "派生数据生成完成");
                self.sink.emit(LifecycleEvent::new(
                    order_id,
                    topic,
                    EventLevel::Success,
                    format!("{} generated: {} rows", kind, rows),
                ));
            }
            Ok(GenerationOutcome::ConsistencyWarning { message, .. }) => {
                tracing::warn!(order_id, kind = %kind, "{}", message);
                self.sink.emit(LifecycleEvent::new(
                    order_id,
                    topic,
                    EventLevel::Warning,
                    message.clone(),
                ));
            }
            Err(e @ LifecycleError::Precondition { .. }) => {
                tracing::warn!(order_id, kind = %kind, status = %order.status, "生成前置条件不满足");
                self.sink.emit(LifecycleEvent::new(
                    order_id,
                    topic,
                    EventLevel::Rejection,
                    e.to_string(),
                ));
            }
            Err(e) => {
                tracing::warn!(order_id, kind = %kind, error = %e, "派生数据生成失败");
                self.sink.emit(LifecycleEvent::new(
                    order_id,
                    topic,
                    EventLevel::Error,
                    e.to_string(),
                ));
            }
        }

        result
    }

    // 持锁期间执行
    async fn run_locked(
        &self,
        order: &ManufacturingOrder,
        kind: GenerationKind,
    ) -> LifecycleResult<GenerationOutcome> {
        if order.status != kind.required_status() {
            return Err(LifecycleError::Precondition {
                kind,
                status: order.status,
            });
        }

        remote::invoke(self.remote.as_ref(), &order.order_id, kind)
            .await
            .map_err(LifecycleError::Remote)?;

        self.compensation.settle(&order.order_id, kind).await;

        let outcome = match self.count_rows(order, kind).await {
            Ok(0) => GenerationOutcome::ConsistencyWarning {
                kind,
                message: format!(
                    "{} generation accepted but no rows are visible yet; refresh or retry",
                    kind
                ),
            },
            Ok(rows) => GenerationOutcome::Completed { kind, rows },
            Err(e) => GenerationOutcome::ConsistencyWarning {
                kind,
                message: format!(
                    "{} generation accepted but verification read failed: {}",
                    kind, e
                ),
            },
        };

        Ok(outcome)
    }

    // 校验读取: 重新取回派生聚合的行数
    async fn count_rows(&self, order: &ManufacturingOrder, kind: GenerationKind) -> RepositoryResult<usize> {
        match kind {
            GenerationKind::Bom => Ok(load_bom_lines(self.store.as_ref(), order).await?.len()),
            GenerationKind::CutList => {
                let (_, lines) = load_cut_job_lines(self.store.as_ref(), order).await?;
                Ok(lines.len())
            }
        }
    }
}
