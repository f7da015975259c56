// ==========================================
// 制造工单生命周期引擎 - 授权闸门
// ==========================================
// 职责: 角色→权限推导在外部完成，这里只消费布尔能力标志
// 说明: 闸门是 UI 级前置检查，不能替代防呆校验
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::order::ManufacturingOrder;
use crate::domain::types::{GenerationKind, OrderStatus};

/// 授权闸门
pub trait AuthorizationGate: Send + Sync {
    /// 是否允许把工单推进到 target
    fn can_advance(&self, order: &ManufacturingOrder, target: OrderStatus) -> bool;

    /// 是否允许发起某类派生数据生成
    fn can_generate(&self, order: &ManufacturingOrder, kind: GenerationKind) -> bool;
}

/// 能力标志
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
    pub can_advance_status: bool,
    pub can_cancel: bool,
    pub can_generate_bom: bool,
    pub can_generate_cut_list: bool,
}

impl CapabilityFlags {
    /// 全部放行（运维工具使用）
    pub fn all() -> Self {
        Self {
            can_advance_status: true,
            can_cancel: true,
            can_generate_bom: true,
            can_generate_cut_list: true,
        }
    }

    /// 全部拒绝
    pub fn none() -> Self {
        Self::default()
    }
}

impl AuthorizationGate for CapabilityFlags {
    fn can_advance(&self, _order: &ManufacturingOrder, target: OrderStatus) -> bool {
        match target {
            OrderStatus::Cancelled => self.can_cancel,
            _ => self.can_advance_status,
        }
    }

    fn can_generate(&self, _order: &ManufacturingOrder, kind: GenerationKind) -> bool {
        match kind {
            GenerationKind::Bom => self.can_generate_bom,
            GenerationKind::CutList => self.can_generate_cut_list,
        }
    }
}
