// ==========================================
// 制造工单生命周期引擎 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供运维工具与上层应用调用
// ==========================================

pub mod error;
pub mod lifecycle_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use lifecycle_api::{OrderLifecycleApi, OrderReadiness};
