// ==========================================
// 制造工单生命周期引擎 - 引擎层
// ==========================================
// 职责: 状态机、防呆校验、派生数据生成编排、汇总
// 红线: Engine 不拼 SQL, 所有拒绝必须输出 reason
// 红线: 外部协作方 (仓储/远端/通知/授权) 一律经 trait 注入
// ==========================================

pub mod aggregation;
pub mod auth;
pub mod compensation;
pub mod cut_list;
pub mod error;
pub mod events;
pub mod generation;
pub mod generation_lock;
pub mod guard_rail;
pub mod materials;
pub mod remote;
pub mod repositories;
pub mod state_machine;

// 重导出核心引擎
pub use auth::{AuthorizationGate, CapabilityFlags};
pub use compensation::{ConsistencyCompensation, FixedDelayCompensation, ImmediateCompensation};
pub use cut_list::{CutListAggregator, CutListSummary};
pub use error::{LifecycleError, LifecycleResult, RemoteCallError};
pub use events::{
    CollectingNotificationSink, EventLevel, EventTopic, LifecycleEvent, NoOpNotificationSink,
    NotificationSink, OptionalNotificationSink, TracingNotificationSink,
};
pub use generation::{GenerationOrchestrator, GenerationOutcome};
pub use generation_lock::{GenerationLockGuard, GenerationLockRegistry};
pub use guard_rail::{GuardRailDenial, GuardRailValidator, GuardRailVerdict};
pub use materials::{MaterialsAggregator, MaterialsSummary};
pub use remote::{RemoteGenerator, UnavailableRemoteGenerator};
pub use repositories::{LifecycleRepositories, OrderStore};
pub use state_machine::{
    Confirmation, PendingTransition, StatusStateMachine, TransitionOutcome, TransitionRequest,
};
