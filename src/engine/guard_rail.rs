// ==========================================
// 制造工单生命周期引擎 - BOM 防呆校验
// ==========================================
// 职责: 判断工单的 BOM 链路是否已实际落地
// 链路: SaleOrderLine → BomInstance → BomInstanceLine
// 红线: 每次调用都从仓储重新读取，禁止缓存
// 红线: 每个拒绝都必须带具体步骤原因
// ==========================================

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::domain::order::ManufacturingOrder;
use crate::domain::types::OrderStatus;
use crate::engine::repositories::OrderStore;
use crate::repository::RepositoryResult;

// ==========================================
// GuardRailDenial - 拒绝原因
// ==========================================
// Display 文本原样用于用户提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardRailDenial {
    /// 销售订单下没有有效行
    NoSaleOrderLines,
    /// BOM 从未生成
    NoBomInstances,
    /// BOM 已生成但明细被清空
    BomHasNoLines,
}

impl GuardRailDenial {
    pub fn reason(&self) -> &'static str {
        match self {
            GuardRailDenial::NoSaleOrderLines => "no sale order lines",
            GuardRailDenial::NoBomInstances => "no BOM instances",
            GuardRailDenial::BomHasNoLines => "BOM has no lines",
        }
    }

    /// 处理建议（生成 / 重新生成）
    pub fn hint(&self) -> &'static str {
        match self {
            GuardRailDenial::NoSaleOrderLines => "请先为销售订单添加订单行",
            GuardRailDenial::NoBomInstances => "请先生成 BOM",
            GuardRailDenial::BomHasNoLines => "BOM 明细已被清空，请重新生成 BOM",
        }
    }
}

impl fmt::Display for GuardRailDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason())
    }
}

// ==========================================
// GuardRailVerdict - 校验结论
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardRailVerdict {
    pub order_id: String,
    /// 是否实际走了链路检查（目标状态不需要防呆时为 false）
    pub guard_applied: bool,
    pub sale_order_line_count: usize,
    pub bom_instance_count: usize,
    pub bom_lines_present: bool,
    pub denial: Option<GuardRailDenial>,
}

impl GuardRailVerdict {
    fn not_required(order_id: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            guard_applied: false,
            sale_order_line_count: 0,
            bom_instance_count: 0,
            bom_lines_present: false,
            denial: None,
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.denial.is_none()
    }
}

// ==========================================
// GuardRailValidator
// ==========================================
pub struct GuardRailValidator {
    store: Arc<dyn OrderStore>,
}

impl GuardRailValidator {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// 针对目标状态判定
    ///
    /// 仅 planned / in_production 需要走链路；其余目标直接放行
    pub async fn authorize(
        &self,
        order: &ManufacturingOrder,
        target: OrderStatus,
    ) -> RepositoryResult<GuardRailVerdict> {
        if !target.requires_bom_guard() {
            return Ok(GuardRailVerdict::not_required(&order.order_id));
        }
        self.check(order).await
    }

    /// 无条件走一遍三步链路
    pub async fn check(&self, order: &ManufacturingOrder) -> RepositoryResult<GuardRailVerdict> {
        let tenant_id = order.tenant_id.as_str();
        let mut verdict = GuardRailVerdict {
            order_id: order.order_id.clone(),
            guard_applied: true,
            sale_order_line_count: 0,
            bom_instance_count: 0,
            bom_lines_present: false,
            denial: None,
        };

        // 步骤 1: 销售订单行
        let so_lines = self
            .store
            .list_sale_order_lines(tenant_id, &order.sale_order_id)
            .await?;
        verdict.sale_order_line_count = so_lines.len();
        tracing::debug!(
            order_id = %order.order_id,
            sale_order_id = %order.sale_order_id,
            count = so_lines.len(),
            "防呆校验步骤1: 销售订单行"
        );
        if so_lines.is_empty() {
            verdict.denial = Some(GuardRailDenial::NoSaleOrderLines);
            return Ok(verdict);
        }

        // 步骤 2: BOM 实例
        let so_line_ids: Vec<String> = so_lines.into_iter().map(|l| l.line_id).collect();
        let instances = self
            .store
            .list_bom_instances(tenant_id, &so_line_ids)
            .await?;
        verdict.bom_instance_count = instances.len();
        tracing::debug!(
            order_id = %order.order_id,
            count = instances.len(),
            "防呆校验步骤2: BOM 实例"
        );
        if instances.is_empty() {
            verdict.denial = Some(GuardRailDenial::NoBomInstances);
            return Ok(verdict);
        }

        // 步骤 3: BOM 明细（存在性检查）
        let instance_ids: Vec<String> = instances.into_iter().map(|i| i.bom_instance_id).collect();
        let exists = self
            .store
            .exists_bom_instance_line(tenant_id, &instance_ids)
            .await?;
        verdict.bom_lines_present = exists;
        tracing::debug!(
            order_id = %order.order_id,
            exists,
            "防呆校验步骤3: BOM 明细"
        );
        if !exists {
            verdict.denial = Some(GuardRailDenial::BomHasNoLines);
        }

        Ok(verdict)
    }

    /// 批量校验（列表页就绪状态展示），各工单并发读取
    ///
    /// 返回顺序与输入一致
    pub async fn check_many(
        &self,
        orders: &[ManufacturingOrder],
    ) -> Vec<(String, RepositoryResult<GuardRailVerdict>)> {
        let futures = orders.iter().map(|order| async move {
            (order.order_id.clone(), self.check(order).await)
        });
        join_all(futures).await
    }
}
