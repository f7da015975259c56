// ==========================================
// 制造工单生命周期引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、补丁对象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod bom;
pub mod cut_list;
pub mod order;
pub mod types;

// 重导出核心类型
pub use bom::{BomInstance, BomInstanceLine, SaleOrderLine};
pub use cut_list::{CutJob, CutJobLine};
pub use order::{write_if_absent, ManufacturingOrder, OrderDetailsPatch, OrderStatusPatch};
pub use types::{GenerationKind, OrderPriority, OrderStatus, UomClass};
