// ==========================================
// 制造工单生命周期引擎 - 领域类型定义
// ==========================================
// 职责: 工单状态、优先级、生成类型、计量单位类别
// 序列化格式: snake_case (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工单状态 (Order Status)
// ==========================================
// 线性主链: draft → planned → in_production → completed
// cancelled 可从任意非终态进入; completed/cancelled 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,        // 草稿
    Planned,      // 已计划
    InProduction, // 生产中
    Completed,    // 已完成
    Cancelled,    // 已取消
}

impl OrderStatus {
    /// 主链顺序（取消不在主链上）
    pub const LINEAR_SEQUENCE: [OrderStatus; 4] = [
        OrderStatus::Draft,
        OrderStatus::Planned,
        OrderStatus::InProduction,
        OrderStatus::Completed,
    ];

    /// 是否终态（无出边）
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// 主链上的直接后继
    pub fn successor(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Draft => Some(OrderStatus::Planned),
            OrderStatus::Planned => Some(OrderStatus::InProduction),
            OrderStatus::InProduction => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }

    /// 进入该状态是否需要 BOM 防呆校验
    pub fn requires_bom_guard(self) -> bool {
        matches!(self, OrderStatus::Planned | OrderStatus::InProduction)
    }

    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Some(OrderStatus::Draft),
            "planned" => Some(OrderStatus::Planned),
            "in_production" => Some(OrderStatus::InProduction),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Planned => "planned",
            OrderStatus::InProduction => "in_production",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 工单优先级 (Order Priority)
// ==========================================
// 顺序: Low < Normal < High < Urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPriority {
    Low,    // 低
    Normal, // 普通
    High,   // 高
    Urgent, // 紧急
}

impl OrderPriority {
    /// 从字符串解析优先级，未知值按 Normal 处理
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => OrderPriority::Low,
            "high" => OrderPriority::High,
            "urgent" => OrderPriority::Urgent,
            _ => OrderPriority::Normal,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderPriority::Low => "low",
            OrderPriority::Normal => "normal",
            OrderPriority::High => "high",
            OrderPriority::Urgent => "urgent",
        }
    }
}

impl Default for OrderPriority {
    fn default() -> Self {
        OrderPriority::Normal
    }
}

impl fmt::Display for OrderPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 派生数据生成类型 (Generation Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Bom,     // 物料清单
    CutList, // 下料单
}

impl GenerationKind {
    /// 允许发起生成的工单状态
    pub fn required_status(self) -> OrderStatus {
        match self {
            GenerationKind::Bom => OrderStatus::Draft,
            GenerationKind::CutList => OrderStatus::Planned,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::Bom => "bom",
            GenerationKind::CutList => "cut_list",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 计量单位类别 (UoM Class)
// ==========================================
// 汇总时按类别归一: 长度→米, 面积→平方米, 重量→千克, 计数→件
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UomClass {
    Length,
    Area,
    Weight,
    Count,
    Other,
}

impl UomClass {
    /// 按单位编码分类，并给出换算到基准单位的系数
    pub fn classify(uom: &str) -> (UomClass, f64) {
        match uom.trim().to_lowercase().as_str() {
            "m" | "meter" | "meters" | "lm" => (UomClass::Length, 1.0),
            "mm" => (UomClass::Length, 0.001),
            "cm" => (UomClass::Length, 0.01),
            "in" | "inch" | "inches" => (UomClass::Length, 0.0254),
            "ft" | "foot" | "feet" => (UomClass::Length, 0.3048),
            "yd" | "yard" | "yards" => (UomClass::Length, 0.9144),
            "m2" | "sqm" | "m²" => (UomClass::Area, 1.0),
            "ft2" | "sqft" => (UomClass::Area, 0.092_903),
            "yd2" | "sqyd" => (UomClass::Area, 0.836_127),
            "kg" => (UomClass::Weight, 1.0),
            "g" => (UomClass::Weight, 0.001),
            "lb" | "lbs" => (UomClass::Weight, 0.453_592),
            "ea" | "each" | "pc" | "pcs" | "unit" | "units" | "set" | "sets" => {
                (UomClass::Count, 1.0)
            }
            _ => (UomClass::Other, 1.0),
        }
    }

    /// 基准单位
    pub fn base_unit(&self) -> &'static str {
        match self {
            UomClass::Length => "m",
            UomClass::Area => "m2",
            UomClass::Weight => "kg",
            UomClass::Count => "ea",
            UomClass::Other => "",
        }
    }
}

impl fmt::Display for UomClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UomClass::Length => "length",
            UomClass::Area => "area",
            UomClass::Weight => "weight",
            UomClass::Count => "count",
            UomClass::Other => "other",
        };
        write!(f, "{}", s)
    }
}
