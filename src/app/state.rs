// ==========================================
// 制造工单生命周期引擎 - 应用状态
// ==========================================
// 职责: 组装仓储、引擎与 API，管理共享资源
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::OrderLifecycleApi;
use crate::config::config_manager::ConfigManager;
use crate::config::LifecycleConfigReader;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{
    AuthorizationGate, CapabilityFlags, ConsistencyCompensation, CutListAggregator,
    FixedDelayCompensation, GenerationLockRegistry, GenerationOrchestrator, GuardRailValidator,
    LifecycleRepositories, MaterialsAggregator, NotificationSink, OptionalNotificationSink,
    OrderStore, RemoteGenerator, StatusStateMachine, TracingNotificationSink,
    UnavailableRemoteGenerator,
};

/// 外部协作方
///
/// 远端生成过程、通知接收方、授权闸门均由宿主应用提供
pub struct Collaborators {
    pub remote: Arc<dyn RemoteGenerator>,
    pub sink: Arc<dyn NotificationSink>,
    pub gate: Arc<dyn AuthorizationGate>,
    /// None 时按配置构造固定间隔补偿
    pub compensation: Option<Arc<dyn ConsistencyCompensation>>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            remote: Arc::new(UnavailableRemoteGenerator),
            sink: Arc::new(TracingNotificationSink),
            gate: Arc::new(CapabilityFlags::all()),
            compensation: None,
        }
    }
}

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 仓储集合
    pub repositories: LifecycleRepositories,

    /// 生成在途锁（进程内共享）
    pub generation_locks: Arc<GenerationLockRegistry>,

    /// 工单生命周期 API
    pub lifecycle_api: Arc<OrderLifecycleApi>,
}

impl AppState {
    /// 使用默认协作方创建 AppState
    pub async fn new(db_path: String) -> Result<Self, String> {
        Self::with_collaborators(db_path, Collaborators::default()).await
    }

    /// 创建 AppState
    ///
    /// # 说明
    /// 1. 打开共享连接并确保表结构存在
    /// 2. 初始化 Repository / Config
    /// 3. 初始化 Engine 与 API
    pub async fn with_collaborators(
        db_path: String,
        collaborators: Collaborators,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库表结构初始化失败: {}", e))?;
        let conn: Arc<Mutex<Connection>> = Arc::new(Mutex::new(conn));

        // ==========================================
        // Repository / Config
        // ==========================================
        let repositories = LifecycleRepositories::from_connection(conn.clone());
        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // Engine
        // ==========================================
        let store: Arc<dyn OrderStore> = Arc::new(repositories.clone());
        let sink = OptionalNotificationSink::with_sink(collaborators.sink);

        let compensation: Arc<dyn ConsistencyCompensation> = match collaborators.compensation {
            Some(c) => c,
            None => Arc::new(FixedDelayCompensation::from_config(config.as_ref()).await),
        };

        let generation_locks = Arc::new(GenerationLockRegistry::new());
        let guard = Arc::new(GuardRailValidator::new(store.clone()));
        let state_machine = Arc::new(StatusStateMachine::new(
            store.clone(),
            guard.clone(),
            sink.clone(),
        ));
        let orchestrator = Arc::new(GenerationOrchestrator::new(
            store.clone(),
            collaborators.remote,
            compensation,
            generation_locks.clone(),
            sink,
        ));
        let materials = Arc::new(MaterialsAggregator::from_config(config.as_ref()).await);
        let cut_list = Arc::new(CutListAggregator::from_config(config.as_ref()).await);

        // ==========================================
        // API
        // ==========================================
        let lifecycle_api = Arc::new(OrderLifecycleApi::new(
            store,
            guard,
            state_machine,
            orchestrator,
            materials,
            cut_list,
            collaborators.gate,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            config,
            repositories,
            generation_locks,
            lifecycle_api,
        })
    }

    /// 运维工具未指定租户时使用的租户
    pub async fn default_tenant_id(&self) -> String {
        match self.config.get_default_tenant_id().await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "读取默认租户失败，使用 default");
                crate::config::config_manager::DEFAULT_TENANT_ID.to_string()
            }
        }
    }
}

/// 获取默认数据库路径
///
/// 顺序: 环境变量 MO_LIFECYCLE_DB_PATH → 用户数据目录 → ./mo_lifecycle.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("MO_LIFECYCLE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./mo_lifecycle.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("mo-lifecycle");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("mo_lifecycle.db");
        }
    }

    path.to_string_lossy().to_string()
}
