// ==========================================
// 制造工单生命周期引擎 - 下料单领域模型
// ==========================================
// CutJob / CutJobLine: 与 BomInstance / BomInstanceLine 平行
// 只能在工单为 planned 时由下料单生成流程创建
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// CutJob - 下料任务
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutJob {
    pub cut_job_id: String,
    pub tenant_id: String,
    pub order_id: String,
    pub status: String, // 车间侧状态 (open/cutting/done)，本引擎只读
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
}

// ==========================================
// CutJobLine - 下料明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutJobLine {
    pub line_id: String,
    pub tenant_id: String,
    pub cut_job_id: String,
    pub sale_order_line_id: Option<String>,
    pub part_role: Option<String>,
    pub description: String,
    pub cut_length_mm: f64, // 下料长度 (mm)
    pub quantity: i32,      // 件数
    pub uom: String,
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
}

impl CutJobLine {
    /// 本行累计下料长度 (米)
    pub fn total_length_m(&self) -> f64 {
        self.cut_length_mm * f64::from(self.quantity) / 1000.0
    }
}
