// ==========================================
// 集成测试环境 - 组装完整的引擎与 API
// ==========================================

use chrono::NaiveDate;
use mo_lifecycle::api::OrderLifecycleApi;
use mo_lifecycle::engine::{
    AuthorizationGate, CapabilityFlags, CollectingNotificationSink, CutListAggregator, EventLevel,
    EventTopic, GenerationLockRegistry, GenerationOrchestrator, GuardRailValidator,
    LifecycleEvent, LifecycleRepositories, MaterialsAggregator, OptionalNotificationSink,
    OrderStore, StatusStateMachine,
};
use std::sync::Arc;
use tempfile::NamedTempFile;

use super::flaky_store::FlakyStore;
use super::mock_compensation::RecordingCompensation;
use super::mock_remote::MaterializingRemote;

#[path = "../test_helpers.rs"]
mod test_helpers;

pub const TENANT: &str = "t1";

/// 测试中的"今天"
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

pub struct TestEnv {
    _temp_file: NamedTempFile,
    pub db_path: String,
    pub repos: LifecycleRepositories,
    pub store: Arc<FlakyStore>,
    pub remote: Arc<MaterializingRemote>,
    pub compensation: Arc<RecordingCompensation>,
    pub sink: Arc<CollectingNotificationSink>,
    pub locks: Arc<GenerationLockRegistry>,
    pub guard: Arc<GuardRailValidator>,
    pub state_machine: Arc<StatusStateMachine>,
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub api: Arc<OrderLifecycleApi>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_gate(Arc::new(CapabilityFlags::all()))
    }

    pub fn with_gate(gate: Arc<dyn AuthorizationGate>) -> Self {
        mo_lifecycle::logging::init_test();
        let (temp_file, db_path) = test_helpers::create_test_db().unwrap();
        let conn = test_helpers::open_shared_connection(&db_path).unwrap();

        let repos = LifecycleRepositories::from_connection(conn);
        let store = Arc::new(FlakyStore::new(Arc::new(repos.clone())));
        let dyn_store: Arc<dyn OrderStore> = store.clone();

        let remote = Arc::new(MaterializingRemote::new(repos.clone(), TENANT));
        let compensation = Arc::new(RecordingCompensation::flushing(remote.clone()));
        let sink = Arc::new(CollectingNotificationSink::new());
        let optional_sink = OptionalNotificationSink::with_sink(sink.clone());
        let locks = Arc::new(GenerationLockRegistry::new());

        let guard = Arc::new(GuardRailValidator::new(dyn_store.clone()));
        let state_machine = Arc::new(StatusStateMachine::new(
            dyn_store.clone(),
            guard.clone(),
            optional_sink.clone(),
        ));
        let orchestrator = Arc::new(GenerationOrchestrator::new(
            dyn_store.clone(),
            remote.clone(),
            compensation.clone(),
            locks.clone(),
            optional_sink,
        ));
        let api = Arc::new(OrderLifecycleApi::new(
            dyn_store,
            guard.clone(),
            state_machine.clone(),
            orchestrator.clone(),
            Arc::new(MaterialsAggregator::default()),
            Arc::new(CutListAggregator::default()),
            gate,
        ));

        Self {
            _temp_file: temp_file,
            db_path,
            repos,
            store,
            remote,
            compensation,
            sink,
            locks,
            guard,
            state_machine,
            orchestrator,
            api,
        }
    }

    /// 按主题与级别过滤已收集事件
    pub fn events(&self, topic: EventTopic, level: EventLevel) -> Vec<LifecycleEvent> {
        self.sink
            .events()
            .into_iter()
            .filter(|e| e.topic == topic && e.level == level)
            .collect()
    }
}
