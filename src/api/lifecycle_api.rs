// ==========================================
// 制造工单生命周期引擎 - 工单生命周期 API
// ==========================================
// 职责: 参数校验 → 授权闸门 → 调用引擎 → 错误转换
// 红线: 授权闸门只在本层检查，引擎不感知角色
// ==========================================

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::order::{ManufacturingOrder, OrderDetailsPatch};
use crate::domain::types::{GenerationKind, OrderStatus};
use crate::engine::auth::AuthorizationGate;
use crate::engine::cut_list::{CutListAggregator, CutListSummary};
use crate::engine::generation::{GenerationOrchestrator, GenerationOutcome};
use crate::engine::guard_rail::{GuardRailValidator, GuardRailVerdict};
use crate::engine::materials::{MaterialsAggregator, MaterialsSummary};
use crate::engine::repositories::{load_bom_lines, load_cut_job_lines, OrderStore};
use crate::engine::state_machine::{
    Confirmation, PendingTransition, StatusStateMachine, TransitionOutcome, TransitionRequest,
};

/// 列表页就绪状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReadiness {
    pub order_id: String,
    pub order_no: String,
    pub status: OrderStatus,
    pub allowed_targets: Vec<OrderStatus>,
    pub verdict: GuardRailVerdict,
}

// ==========================================
// OrderLifecycleApi
// ==========================================
pub struct OrderLifecycleApi {
    store: Arc<dyn OrderStore>,
    guard: Arc<GuardRailValidator>,
    state_machine: Arc<StatusStateMachine>,
    orchestrator: Arc<GenerationOrchestrator>,
    materials: Arc<MaterialsAggregator>,
    cut_list: Arc<CutListAggregator>,
    gate: Arc<dyn AuthorizationGate>,
}

impl OrderLifecycleApi {
    pub fn new(
        store: Arc<dyn OrderStore>,
        guard: Arc<GuardRailValidator>,
        state_machine: Arc<StatusStateMachine>,
        orchestrator: Arc<GenerationOrchestrator>,
        materials: Arc<MaterialsAggregator>,
        cut_list: Arc<CutListAggregator>,
        gate: Arc<dyn AuthorizationGate>,
    ) -> Self {
        Self {
            store,
            guard,
            state_machine,
            orchestrator,
            materials,
            cut_list,
            gate,
        }
    }

    /// 读取工单（租户内、未删除）
    pub async fn get_order(&self, tenant_id: &str, order_id: &str) -> ApiResult<ManufacturingOrder> {
        if tenant_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("租户ID不能为空".to_string()));
        }
        if order_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("工单ID不能为空".to_string()));
        }

        self.store
            .find_order(tenant_id, order_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("ManufacturingOrder(id={})不存在", order_id)))
    }

    pub async fn list_orders(
        &self,
        tenant_id: &str,
        status: Option<OrderStatus>,
    ) -> ApiResult<Vec<ManufacturingOrder>> {
        if tenant_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("租户ID不能为空".to_string()));
        }
        Ok(self.store.list_orders(tenant_id, status).await?)
    }

    /// 列表页: 批量计算就绪状态
    pub async fn list_readiness(
        &self,
        tenant_id: &str,
        status: Option<OrderStatus>,
    ) -> ApiResult<Vec<OrderReadiness>> {
        let orders = self.list_orders(tenant_id, status).await?;
        let verdicts = self.guard.check_many(&orders).await;

        let mut out = Vec::with_capacity(orders.len());
        for (order, (_, verdict)) in orders.into_iter().zip(verdicts) {
            let allowed_targets = self.offered_targets(&order);
            out.push(OrderReadiness {
                order_id: order.order_id,
                order_no: order.order_no,
                status: order.status,
                allowed_targets,
                verdict: verdict?,
            });
        }
        Ok(out)
    }

    /// 单个工单的就绪状态（不发起流转）
    pub async fn readiness(&self, tenant_id: &str, order_id: &str) -> ApiResult<GuardRailVerdict> {
        let order = self.get_order(tenant_id, order_id).await?;
        Ok(self.guard.check(&order).await?)
    }

    /// 当前用户可见的目标状态
    pub async fn allowed_targets(&self, tenant_id: &str, order_id: &str) -> ApiResult<Vec<OrderStatus>> {
        let order = self.get_order(tenant_id, order_id).await?;
        Ok(self.offered_targets(&order))
    }

    fn offered_targets(&self, order: &ManufacturingOrder) -> Vec<OrderStatus> {
        StatusStateMachine::allowed_targets(order.status)
            .into_iter()
            .filter(|t| self.gate.can_advance(order, *t))
            .collect()
    }

    // ==========================================
    // 状态流转
    // ==========================================

    pub async fn request_transition(
        &self,
        tenant_id: &str,
        order_id: &str,
        target: OrderStatus,
    ) -> ApiResult<TransitionRequest> {
        self.request_transition_on(tenant_id, order_id, target, Local::now().date_naive())
            .await
    }

    /// 指定"当前日期"发起流转（实际开工/完工日期取此值）
    pub async fn request_transition_on(
        &self,
        tenant_id: &str,
        order_id: &str,
        target: OrderStatus,
        today: NaiveDate,
    ) -> ApiResult<TransitionRequest> {
        let order = self.get_order(tenant_id, order_id).await?;
        self.ensure_can_advance(&order, target)?;
        Ok(self
            .state_machine
            .request_transition(&order, target, today)
            .await?)
    }

    pub async fn confirm_transition(
        &self,
        pending: PendingTransition,
        confirmation: Confirmation,
    ) -> ApiResult<TransitionOutcome> {
        self.ensure_can_advance(&pending.order, pending.to)?;
        Ok(self.state_machine.confirm(pending, confirmation).await?)
    }

    /// 发起并直接确认（调用方已显式确认，如运维命令）
    pub async fn advance(
        &self,
        tenant_id: &str,
        order_id: &str,
        target: OrderStatus,
        today: NaiveDate,
    ) -> ApiResult<TransitionOutcome> {
        match self
            .request_transition_on(tenant_id, order_id, target, today)
            .await?
        {
            TransitionRequest::Unchanged(order) => Ok(TransitionOutcome::Unchanged(order)),
            TransitionRequest::AwaitingConfirmation(pending) => {
                self.confirm_transition(pending, Confirmation::Granted).await
            }
        }
    }

    fn ensure_can_advance(&self, order: &ManufacturingOrder, target: OrderStatus) -> ApiResult<()> {
        if self.gate.can_advance(order, target) {
            return Ok(());
        }
        tracing::warn!(order_id = %order.order_id, to = %target, "授权闸门拒绝状态流转");
        Err(ApiError::Forbidden(format!(
            "无权将工单{}推进到{}",
            order.order_no, target
        )))
    }

    // ==========================================
    // 派生数据生成
    // ==========================================

    pub async fn generate(
        &self,
        tenant_id: &str,
        order_id: &str,
        kind: GenerationKind,
    ) -> ApiResult<GenerationOutcome> {
        let order = self.get_order(tenant_id, order_id).await?;
        if !self.gate.can_generate(&order, kind) {
            tracing::warn!(order_id = %order.order_id, kind = %kind, "授权闸门拒绝生成");
            return Err(ApiError::Forbidden(format!(
                "无权为工单{}生成{}",
                order.order_no, kind
            )));
        }
        Ok(self.orchestrator.generate(&order, kind).await?)
    }

    // ==========================================
    // 汇总查询
    // ==========================================

    pub async fn materials(&self, tenant_id: &str, order_id: &str) -> ApiResult<MaterialsSummary> {
        let order = self.get_order(tenant_id, order_id).await?;
        let lines = load_bom_lines(self.store.as_ref(), &order).await?;
        Ok(self.materials.summarize(lines))
    }

    pub async fn cut_list(&self, tenant_id: &str, order_id: &str) -> ApiResult<CutListSummary> {
        let order = self.get_order(tenant_id, order_id).await?;
        let (job, lines) = load_cut_job_lines(self.store.as_ref(), &order).await?;
        Ok(self
            .cut_list
            .summarize(job.map(|j| j.cut_job_id), lines))
    }

    /// 导出车间下料表
    pub async fn export_cut_list_csv<W: Write>(
        &self,
        tenant_id: &str,
        order_id: &str,
        writer: W,
    ) -> ApiResult<()> {
        let summary = self.cut_list(tenant_id, order_id).await?;
        CutListAggregator::write_csv(&summary, writer)
            .map_err(|e| ApiError::InternalError(format!("下料表导出失败: {}", e)))
    }

    // ==========================================
    // 非状态字段编辑 / 归档
    // ==========================================

    /// 编辑备注、优先级、计划日期（不跨越状态边界）
    pub async fn update_details(
        &self,
        tenant_id: &str,
        order_id: &str,
        patch: OrderDetailsPatch,
    ) -> ApiResult<ManufacturingOrder> {
        if patch.is_empty() {
            return Err(ApiError::InvalidInput("没有需要更新的字段".to_string()));
        }

        let order = self.get_order(tenant_id, order_id).await?;
        let start = patch.scheduled_start_date.or(order.scheduled_start_date);
        let end = patch.scheduled_end_date.or(order.scheduled_end_date);
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(ApiError::InvalidInput(format!(
                    "计划完工日期{}早于计划开工日期{}",
                    end, start
                )));
            }
        }

        let updated = self.store.update_details(tenant_id, order_id, &patch).await?;
        tracing::info!(order_id, "工单信息已更新");
        Ok(updated)
    }

    /// 软删除（工单从不物理删除）
    pub async fn archive(&self, tenant_id: &str, order_id: &str) -> ApiResult<()> {
        let order = self.get_order(tenant_id, order_id).await?;
        self.store.archive_order(tenant_id, &order.order_id).await?;
        tracing::info!(order_id, "工单已归档");
        Ok(())
    }
}
