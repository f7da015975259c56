// ==========================================
// 制造工单生命周期引擎 - 制造工单领域模型
// ==========================================
// 红线: status 只能经由状态机变更
// 红线: actual_start_date / actual_end_date 只写一次
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{OrderPriority, OrderStatus};

// ==========================================
// ManufacturingOrder - 制造工单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturingOrder {
    pub order_id: String,                        // 工单ID
    pub tenant_id: String,                       // 租户ID
    pub sale_order_id: String,                   // 关联销售订单
    pub order_no: String,                        // 工单编号
    pub status: OrderStatus,                     // 状态
    pub priority: OrderPriority,                 // 优先级
    pub scheduled_start_date: Option<NaiveDate>, // 计划开工
    pub scheduled_end_date: Option<NaiveDate>,   // 计划完工
    pub actual_start_date: Option<NaiveDate>,    // 实际开工 (只写一次)
    pub actual_end_date: Option<NaiveDate>,      // 实际完工 (只写一次)
    pub notes: Option<String>,                   // 备注
    pub is_deleted: bool,                        // 软删除标志
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ManufacturingOrder {
    /// 是否处于终态
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// 只写一次: 已有值时保持不变，否则写入候选值
pub fn write_if_absent(current: Option<NaiveDate>, candidate: NaiveDate) -> Option<NaiveDate> {
    current.or(Some(candidate))
}

// ==========================================
// OrderStatusPatch - 状态变更补丁
// ==========================================
// 由状态机计算，仓储层原样落库
// 日期字段为 Some 时仅在库中为空时写入 (COALESCE)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusPatch {
    pub status: Option<OrderStatus>,
    pub actual_start_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
}

impl OrderStatusPatch {
    /// 计算进入 target 时的补丁
    ///
    /// - 进入 in_production: 若实际开工为空，写入 today
    /// - 进入 completed: 若实际完工为空，写入 today
    pub fn for_transition(order: &ManufacturingOrder, target: OrderStatus, today: NaiveDate) -> Self {
        let actual_start_date = match (target, order.actual_start_date) {
            (OrderStatus::InProduction, None) => Some(today),
            _ => None,
        };
        let actual_end_date = match (target, order.actual_end_date) {
            (OrderStatus::Completed, None) => Some(today),
            _ => None,
        };

        Self {
            status: Some(target),
            actual_start_date,
            actual_end_date,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.actual_start_date.is_none() && self.actual_end_date.is_none()
    }

    /// 把补丁套到内存中的工单上（与仓储层 COALESCE 语义一致）
    pub fn apply_to(&self, order: &mut ManufacturingOrder) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(d) = self.actual_start_date {
            order.actual_start_date = write_if_absent(order.actual_start_date, d);
        }
        if let Some(d) = self.actual_end_date {
            order.actual_end_date = write_if_absent(order.actual_end_date, d);
        }
    }
}

// ==========================================
// OrderDetailsPatch - 非状态字段编辑
// ==========================================
// 不跨越状态边界: 备注、优先级、计划日期
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderDetailsPatch {
    pub notes: Option<String>,
    pub priority: Option<OrderPriority>,
    pub scheduled_start_date: Option<NaiveDate>,
    pub scheduled_end_date: Option<NaiveDate>,
}

impl OrderDetailsPatch {
    pub fn is_empty(&self) -> bool {
        self.notes.is_none()
            && self.priority.is_none()
            && self.scheduled_start_date.is_none()
            && self.scheduled_end_date.is_none()
    }
}
