// ==========================================
// 制造工单生命周期引擎 - 应用层
// ==========================================
// 职责: 组装各层，供运维工具与宿主应用使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, Collaborators};
