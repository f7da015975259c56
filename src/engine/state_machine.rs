// ==========================================
// 制造工单生命周期引擎 - 状态机
// ==========================================
// 主链: draft → planned → in_production → completed
// 取消: 任意非终态 → cancelled（不走防呆）
// 终态: completed / cancelled
// 流程: request_transition 只做判定与补丁计算（无写入）
//       → 外部确认 → confirm 重新校验后落库
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::order::{ManufacturingOrder, OrderStatusPatch};
use crate::domain::types::OrderStatus;
use crate::engine::error::{LifecycleError, LifecycleResult};
use crate::engine::events::{EventLevel, EventTopic, LifecycleEvent, OptionalNotificationSink};
use crate::engine::guard_rail::GuardRailValidator;
use crate::engine::repositories::OrderStore;

/// 待确认的状态流转
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransition {
    pub order: ManufacturingOrder,
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// 发起时计算的补丁（确认时会基于最新工单重算）
    pub patch: OrderStatusPatch,
    pub requested_on: NaiveDate,
}

/// 流转请求结果
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionRequest {
    /// 已处于目标状态，不构成流转
    Unchanged(ManufacturingOrder),
    /// 已授权，等待用户确认
    AwaitingConfirmation(PendingTransition),
}

/// 用户确认结果（由 UI 带外获取）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    Granted,
    Declined,
}

/// 确认后的结果
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied(ManufacturingOrder),
    Unchanged(ManufacturingOrder),
    Declined,
}

/// 是否为合法流转（不含同状态）
pub fn is_legal_transition(from: OrderStatus, to: OrderStatus) -> bool {
    if from.is_terminal() || from == to {
        return false;
    }
    to == OrderStatus::Cancelled || from.successor() == Some(to)
}

// ==========================================
// StatusStateMachine
// ==========================================
pub struct StatusStateMachine {
    store: Arc<dyn OrderStore>,
    guard: Arc<GuardRailValidator>,
    sink: OptionalNotificationSink,
}

impl StatusStateMachine {
    pub fn new(
        store: Arc<dyn OrderStore>,
        guard: Arc<GuardRailValidator>,
        sink: OptionalNotificationSink,
    ) -> Self {
        Self { store, guard, sink }
    }

    /// 当前状态下可提供给用户的目标状态
    pub fn allowed_targets(status: OrderStatus) -> Vec<OrderStatus> {
        let mut targets = Vec::new();
        if status.is_terminal() {
            return targets;
        }
        if let Some(next) = status.successor() {
            targets.push(next);
        }
        targets.push(OrderStatus::Cancelled);
        targets
    }

    /// 发起流转请求
    ///
    /// # 返回
    /// - Unchanged: 已处于目标状态
    /// - AwaitingConfirmation: 已授权，需用户确认后调用 confirm
    /// - Err(InvalidTransition): 跳级 / 回退 / 离开终态
    /// - Err(Validation): 防呆校验拒绝
    pub async fn request_transition(
        &self,
        order: &ManufacturingOrder,
        target: OrderStatus,
        today: NaiveDate,
    ) -> LifecycleResult<TransitionRequest> {
        let result = self.evaluate_request(order, target, today).await;
        if let Err(e) = &result {
            self.report_failure(&order.order_id, target, e);
        }
        result
    }

    async fn evaluate_request(
        &self,
        order: &ManufacturingOrder,
        target: OrderStatus,
        today: NaiveDate,
    ) -> LifecycleResult<TransitionRequest> {
        let from = order.status;
        if from == target {
            tracing::debug!(order_id = %order.order_id, status = %from, "目标状态与当前一致，不构成流转");
            return Ok(TransitionRequest::Unchanged(order.clone()));
        }

        self.ensure_legal(order, from, target)?;
        self.ensure_guard(order, target).await?;

        let patch = OrderStatusPatch::for_transition(order, target, today);
        tracing::info!(
            order_id = %order.order_id,
            from = %from,
            to = %target,
            "状态流转已授权，等待确认"
        );

        Ok(TransitionRequest::AwaitingConfirmation(PendingTransition {
            order: order.clone(),
            from,
            to: target,
            patch,
            requested_on: today,
        }))
    }

    /// 带确认执行流转
    ///
    /// 确认期间链路可能变化，落库前重新读取工单并重跑防呆
    pub async fn confirm(
        &self,
        pending: PendingTransition,
        confirmation: Confirmation,
    ) -> LifecycleResult<TransitionOutcome> {
        if confirmation == Confirmation::Declined {
            tracing::info!(order_id = %pending.order.order_id, to = %pending.to, "用户取消状态流转");
            return Ok(TransitionOutcome::Declined);
        }

        let order_id = pending.order.order_id.clone();
        let to = pending.to;
        let result = self.apply_confirmed(pending).await;
        if let Err(e) = &result {
            self.report_failure(&order_id, to, e);
        }
        result
    }

    async fn apply_confirmed(&self, pending: PendingTransition) -> LifecycleResult<TransitionOutcome> {
        let order_id = pending.order.order_id.clone();
        let tenant_id = pending.order.tenant_id.clone();

        let current = self
            .store
            .find_order(&tenant_id, &order_id)
            .await?
            .ok_or_else(|| LifecycleError::OrderNotFound(order_id.clone()))?;

        if current.status == pending.to {
            return Ok(TransitionOutcome::Unchanged(current));
        }

        self.ensure_legal(&current, current.status, pending.to)?;
        self.ensure_guard(&current, pending.to).await?;

        let patch = OrderStatusPatch::for_transition(&current, pending.to, pending.requested_on);
        let updated = self.store.update_order(&tenant_id, &order_id, &patch).await?;

        tracing::info!(
            order_id = %order_id,
            from = %current.status,
            to = %updated.status,
            "状态流转完成"
        );
        self.sink.emit(LifecycleEvent::new(
            &order_id,
            EventTopic::Transition,
            EventLevel::Success,
            format!("{} → {}", current.status, updated.status),
        ));

        Ok(TransitionOutcome::Applied(updated))
    }

    fn ensure_legal(
        &self,
        order: &ManufacturingOrder,
        from: OrderStatus,
        to: OrderStatus,
    ) -> LifecycleResult<()> {
        if is_legal_transition(from, to) {
            return Ok(());
        }
        tracing::warn!(order_id = %order.order_id, from = %from, to = %to, "非法状态流转");
        Err(LifecycleError::InvalidTransition { from, to })
    }

    async fn ensure_guard(&self, order: &ManufacturingOrder, to: OrderStatus) -> LifecycleResult<()> {
        let verdict = self.guard.authorize(order, to).await?;
        let Some(denial) = verdict.denial else {
            return Ok(());
        };

        tracing::warn!(
            order_id = %order.order_id,
            to = %to,
            reason = denial.reason(),
            "防呆校验拒绝状态流转"
        );
        Err(LifecycleError::Validation(denial))
    }

    /// 流转失败统一上报: 判定类拒绝为 Rejection，其余（工单消失、读写失败）为 Error
    fn report_failure(&self, order_id: &str, to: OrderStatus, err: &LifecycleError) {
        let (level, message) = match err {
            LifecycleError::Validation(denial) => (EventLevel::Rejection, denial.reason().to_string()),
            LifecycleError::InvalidTransition { .. } => (EventLevel::Rejection, err.to_string()),
            _ => {
                tracing::warn!(order_id, to = %to, error = %err, "状态流转失败");
                (EventLevel::Error, err.to_string())
            }
        };
        self.sink.emit(LifecycleEvent::new(
            order_id,
            EventTopic::Transition,
            level,
            message,
        ));
    }
}
