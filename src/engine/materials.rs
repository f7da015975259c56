// ==========================================
// 制造工单生命周期引擎 - BOM 物料汇总
// ==========================================
// 只读组件: 无锁、无防呆
// 输出: 按类别分组的明细 + 行数 / 数量(按单位类别) / EXW 成本
// ==========================================

use serde::{Deserialize, Serialize};

use crate::config::config_manager::DEFAULT_MATERIALS_PRECEDENCE;
use crate::config::LifecycleConfigReader;
use crate::domain::bom::BomInstanceLine;
use crate::engine::aggregation::{group_by_role, QuantityByUom};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialGroup {
    pub category: String,
    pub lines: Vec<BomInstanceLine>,
    pub line_count: usize,
    pub quantity_by_uom: QuantityByUom,
    pub cost_exw: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialTotals {
    pub line_count: usize,
    pub quantity_by_uom: QuantityByUom,
    pub cost_exw: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialsSummary {
    pub groups: Vec<MaterialGroup>,
    pub totals: MaterialTotals,
}

impl MaterialsSummary {
    pub fn is_empty(&self) -> bool {
        self.totals.line_count == 0
    }
}

pub struct MaterialsAggregator {
    precedence: Vec<String>,
}

impl MaterialsAggregator {
    pub fn new(precedence: Vec<String>) -> Self {
        Self { precedence }
    }

    pub async fn from_config(config: &dyn LifecycleConfigReader) -> Self {
        match config.get_materials_category_precedence().await {
            Ok(precedence) => Self::new(precedence),
            Err(e) => {
                tracing::warn!(error = %e, "读取物料类别顺序失败，使用默认顺序");
                Self::default()
            }
        }
    }

    pub fn precedence(&self) -> &[String] {
        &self.precedence
    }

    pub fn summarize(&self, lines: Vec<BomInstanceLine>) -> MaterialsSummary {
        let mut totals = MaterialTotals::default();

        let groups = group_by_role(lines, &self.precedence, |l| l.part_role.as_deref())
            .into_iter()
            .map(|(category, lines)| {
                let mut quantity_by_uom = QuantityByUom::default();
                let mut cost_exw = 0.0;
                for line in &lines {
                    quantity_by_uom.add(&line.uom, line.qty);
                    cost_exw += line.cost_exw();
                }

                totals.line_count += lines.len();
                totals.quantity_by_uom.merge(&quantity_by_uom);
                totals.cost_exw += cost_exw;

                MaterialGroup {
                    category,
                    line_count: lines.len(),
                    lines,
                    quantity_by_uom,
                    cost_exw,
                }
            })
            .collect();

        MaterialsSummary { groups, totals }
    }
}

impl Default for MaterialsAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_MATERIALS_PRECEDENCE.iter().map(|s| s.to_string()).collect())
    }
}
