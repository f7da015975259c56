// ==========================================
// 制造工单生命周期引擎 - 下料单汇总与导出
// ==========================================
// 输出: 按类别分组的下料明细 + 行数 / 件数 / 总长度(米)
// 导出: 车间下料表 CSV
// ==========================================

use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::config::config_manager::DEFAULT_CUT_LIST_PRECEDENCE;
use crate::config::LifecycleConfigReader;
use crate::domain::cut_list::CutJobLine;
use crate::engine::aggregation::{group_by_role, normalize_role, QuantityByUom};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutListGroup {
    pub category: String,
    pub lines: Vec<CutJobLine>,
    pub line_count: usize,
    pub pieces: i64,
    pub total_length_m: f64,
    pub quantity_by_uom: QuantityByUom,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CutListTotals {
    pub line_count: usize,
    pub pieces: i64,
    pub total_length_m: f64,
    pub quantity_by_uom: QuantityByUom,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CutListSummary {
    pub cut_job_id: Option<String>,
    pub groups: Vec<CutListGroup>,
    pub totals: CutListTotals,
}

impl CutListSummary {
    pub fn is_empty(&self) -> bool {
        self.totals.line_count == 0
    }
}

pub struct CutListAggregator {
    precedence: Vec<String>,
}

impl CutListAggregator {
    pub fn new(precedence: Vec<String>) -> Self {
        Self { precedence }
    }

    pub async fn from_config(config: &dyn LifecycleConfigReader) -> Self {
        match config.get_cut_list_category_precedence().await {
            Ok(precedence) => Self::new(precedence),
            Err(e) => {
                tracing::warn!(error = %e, "读取下料类别顺序失败，使用默认顺序");
                Self::default()
            }
        }
    }

    pub fn precedence(&self) -> &[String] {
        &self.precedence
    }

    pub fn summarize(&self, cut_job_id: Option<String>, lines: Vec<CutJobLine>) -> CutListSummary {
        let mut totals = CutListTotals::default();

        let groups = group_by_role(lines, &self.precedence, |l| l.part_role.as_deref())
            .into_iter()
            .map(|(category, lines)| {
                let mut quantity_by_uom = QuantityByUom::default();
                let mut pieces = 0i64;
                let mut total_length_m = 0.0;
                for line in &lines {
                    quantity_by_uom.add(&line.uom, f64::from(line.quantity));
                    pieces += i64::from(line.quantity);
                    total_length_m += line.total_length_m();
                }

                totals.line_count += lines.len();
                totals.pieces += pieces;
                totals.total_length_m += total_length_m;
                totals.quantity_by_uom.merge(&quantity_by_uom);

                CutListGroup {
                    category,
                    line_count: lines.len(),
                    lines,
                    pieces,
                    total_length_m,
                    quantity_by_uom,
                }
            })
            .collect();

        CutListSummary {
            cut_job_id,
            groups,
            totals,
        }
    }

    /// 导出车间下料表
    ///
    /// 列: category, description, cut_length_mm, quantity, uom
    pub fn write_csv<W: Write>(summary: &CutListSummary, writer: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["category", "description", "cut_length_mm", "quantity", "uom"])?;

        for group in &summary.groups {
            for line in &group.lines {
                wtr.write_record([
                    normalize_role(line.part_role.as_deref()),
                    line.description.clone(),
                    format!("{:.1}", line.cut_length_mm),
                    line.quantity.to_string(),
                    line.uom.clone(),
                ])?;
            }
        }

        wtr.flush()?;
        Ok(())
    }
}

impl Default for CutListAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_CUT_LIST_PRECEDENCE.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn line(id: &str, role: Option<&str>, length_mm: f64, qty: i32) -> CutJobLine {
        CutJobLine {
            line_id: id.to_string(),
            tenant_id: "t1".to_string(),
            cut_job_id: "CJ-1".to_string(),
            sale_order_line_id: None,
            part_role: role.map(|s| s.to_string()),
            description: format!("cut {}", id),
            cut_length_mm: length_mm,
            quantity: qty,
            uom: "ea".to_string(),
            is_deleted: false,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_cut_list_ordering_and_totals() {
        let aggregator = CutListAggregator::default();
        let summary = aggregator.summarize(
            Some("CJ-1".to_string()),
            vec![
                line("1", Some("bottom_bar"), 1200.0, 2),
                line("2", Some("tube"), 1250.0, 1),
                line("3", Some("fabric"), 1500.0, 1),
                line("4", Some("spring"), 100.0, 4),
            ],
        );

        let categories: Vec<&str> = summary.groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(categories, vec!["fabric", "tube", "bottom_bar", "spring"]);
        assert_eq!(summary.totals.pieces, 8);
        assert!((summary.totals.total_length_m - (2.4 + 1.25 + 1.5 + 0.4)).abs() < 1e-9);
    }

    #[test]
    fn test_write_csv() {
        let summary = CutListAggregator::default().summarize(
            Some("CJ-1".to_string()),
            vec![line("1", Some("tube"), 1250.0, 1), line("2", None, 90.0, 2)],
        );

        let mut buf = Vec::new();
        CutListAggregator::write_csv(&summary, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let rows: Vec<&str> = text.lines().collect();

        assert_eq!(rows[0], "category,description,cut_length_mm,quantity,uom");
        assert_eq!(rows[1], "tube,cut 1,1250.0,1,ea");
        assert_eq!(rows[2], "uncategorized,cut 2,90.0,2,ea");
    }
}
