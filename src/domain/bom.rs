// ==========================================
// 制造工单生命周期引擎 - 销售订单行与 BOM 领域模型
// ==========================================
// 归属链: SaleOrderLine → BomInstance → BomInstanceLine
// BomInstance 只由 BOM 生成流程创建，创建后除软删除外不可变
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// SaleOrderLine - 销售订单行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleOrderLine {
    pub line_id: String,
    pub tenant_id: String,
    pub sale_order_id: String,
    pub line_no: i32,
    pub product_name: String,
    pub quantity: f64,
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
}

// ==========================================
// BomInstance - BOM 实例
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomInstance {
    pub bom_instance_id: String,
    pub tenant_id: String,
    pub sale_order_line_id: String,
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
}

// ==========================================
// BomInstanceLine - BOM 明细行
// ==========================================
// 防呆校验只关心"存在未删除的明细行"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomInstanceLine {
    pub line_id: String,
    pub tenant_id: String,
    pub bom_instance_id: String,
    pub part_role: Option<String>,     // 部件角色 (fabric/tube/motor/...)
    pub component_sku: Option<String>, // 物料编码
    pub description: String,           // 描述
    pub qty: f64,                      // 用量
    pub uom: String,                   // 计量单位
    pub unit_cost_exw: Option<f64>,    // EXW 单价
    pub total_cost_exw: Option<f64>,   // EXW 总价
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
}

impl BomInstanceLine {
    /// 行成本: 优先取总价，否则 用量 × 单价
    pub fn cost_exw(&self) -> f64 {
        match (self.total_cost_exw, self.unit_cost_exw) {
            (Some(total), _) => total,
            (None, Some(unit)) => unit * self.qty,
            (None, None) => 0.0,
        }
    }
}
