// ==========================================
// 制造工单生命周期引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,按租户过滤,排除软删除行
// ==========================================

pub mod bom_repo;
pub mod cut_job_repo;
pub mod error;
pub mod order_repo;
pub mod sale_order_line_repo;
pub mod sql_utils;

// 重导出核心仓储
pub use bom_repo::BomRepository;
pub use cut_job_repo::CutJobRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use order_repo::ManufacturingOrderRepository;
pub use sale_order_line_repo::SaleOrderLineRepository;
