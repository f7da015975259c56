// ==========================================
// 制造工单生命周期引擎 - 按部件角色分组
// ==========================================
// 排序: 已知类别按优先顺序 → 未知类别按字母序 → uncategorized
// 组内保持输入顺序
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::domain::types::UomClass;

/// 无 part_role 的行归入此类别
pub const UNCATEGORIZED: &str = "uncategorized";

/// 规整部件角色: 去空白、小写；空值归入 uncategorized
pub fn normalize_role(role: Option<&str>) -> String {
    match role.map(|r| r.trim().to_lowercase()) {
        Some(r) if !r.is_empty() => r,
        _ => UNCATEGORIZED.to_string(),
    }
}

fn category_rank(category: &str, precedence: &[String]) -> (u8, usize) {
    if category == UNCATEGORIZED {
        return (2, 0);
    }
    match precedence.iter().position(|p| p == category) {
        Some(idx) => (0, idx),
        None => (1, 0),
    }
}

/// 按部件角色分组并排序
pub fn group_by_role<T, F>(items: Vec<T>, precedence: &[String], role_of: F) -> Vec<(String, Vec<T>)>
where
    F: Fn(&T) -> Option<&str>,
{
    let mut groups: Vec<(String, Vec<T>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let category = normalize_role(role_of(&item));
        match index.get(&category) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(category.clone(), groups.len());
                groups.push((category, vec![item]));
            }
        }
    }

    groups.sort_by(|a, b| {
        category_rank(&a.0, precedence)
            .cmp(&category_rank(&b.0, precedence))
            .then_with(|| a.0.cmp(&b.0))
    });
    groups
}

/// 按计量单位类别汇总的数量（已换算到基准单位）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantityByUom(pub BTreeMap<UomClass, f64>);

impl QuantityByUom {
    pub fn add(&mut self, uom: &str, qty: f64) {
        let (class, factor) = UomClass::classify(uom);
        *self.0.entry(class).or_insert(0.0) += qty * factor;
    }

    pub fn merge(&mut self, other: &QuantityByUom) {
        for (class, qty) in &other.0 {
            *self.0.entry(*class).or_insert(0.0) += qty;
        }
    }

    pub fn get(&self, class: UomClass) -> f64 {
        self.0.get(&class).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn precedence() -> Vec<String> {
        ["fabric", "tube", "motor"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_known_then_alphabetical_then_uncategorized() {
        let items = vec![
            ("a", Some("zip")),
            ("b", None),
            ("c", Some("tube")),
            ("d", Some("Fabric")),
            ("e", Some("clip")),
            ("f", Some("tube")),
            ("g", Some("  ")),
        ];
        let groups = group_by_role(items, &precedence(), |(_, role)| *role);
        let order: Vec<&str> = groups.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(order, vec!["fabric", "tube", "clip", "zip", UNCATEGORIZED]);

        // 组内保持输入顺序
        let tube: Vec<&str> = groups[1].1.iter().map(|(id, _)| *id).collect();
        assert_eq!(tube, vec!["c", "f"]);
        assert_eq!(groups[4].1.len(), 2);
    }

    #[test]
    fn test_quantity_normalized_by_class() {
        let mut q = QuantityByUom::default();
        q.add("m", 2.0);
        q.add("mm", 500.0);
        q.add("ea", 3.0);
        assert!((q.get(UomClass::Length) - 2.5).abs() < 1e-9);
        assert_eq!(q.get(UomClass::Count), 3.0);
        assert_eq!(q.get(UomClass::Weight), 0.0);
    }
}
