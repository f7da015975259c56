// ==========================================
// Mock 远端生成过程 - 用于集成测试
// ==========================================
// 成功时在本地库中落地派生行，行为可配置:
// - fail_with: 下次调用失败并返回给定消息
// - deferred: 只受理不落地，flush() 时才写入（模拟最终一致）
// - hold: 调用进入后挂起，直到 release 被通知（模拟在途）
// ==========================================

use async_trait::async_trait;
use chrono::Utc;
use mo_lifecycle::domain::bom::BomInstance;
use mo_lifecycle::domain::cut_list::CutJob;
use mo_lifecycle::domain::types::GenerationKind;
use mo_lifecycle::engine::{LifecycleRepositories, RemoteCallError, RemoteGenerator};
use mo_lifecycle::repository::RepositoryResult;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;
use uuid::Uuid;

use super::test_data_builder::{bom_line, cut_line};

pub struct MaterializingRemote {
    repos: LifecycleRepositories,
    tenant_id: String,
    /// 每次 cut_list 生成写入的行数（0 表示受理但不产生行）
    cut_lines_per_job: AtomicUsize,
    failure: Mutex<Option<String>>,
    deferred: AtomicBool,
    pending: Mutex<Vec<(String, GenerationKind)>>,
    hold: AtomicBool,
    calls: AtomicUsize,
    /// 调用进入远端后通知
    pub entered: Notify,
    /// 通知后挂起的调用继续
    pub release: Notify,
}

impl MaterializingRemote {
    pub fn new(repos: LifecycleRepositories, tenant_id: &str) -> Self {
        Self {
            repos,
            tenant_id: tenant_id.to_string(),
            cut_lines_per_job: AtomicUsize::new(3),
            failure: Mutex::new(None),
            deferred: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
            hold: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn set_cut_lines(&self, n: usize) {
        self.cut_lines_per_job.store(n, Ordering::SeqCst);
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn clear_failure(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn set_deferred(&self, deferred: bool) {
        self.deferred.store(deferred, Ordering::SeqCst);
    }

    pub fn set_hold(&self, hold: bool) {
        self.hold.store(hold, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// 落地所有已受理的请求
    pub fn flush(&self) {
        let pending: Vec<_> = self.pending.lock().unwrap().drain(..).collect();
        for (order_id, kind) in pending {
            self.materialize(&order_id, kind).unwrap();
        }
    }

    async fn handle(&self, order_id: &str, kind: GenerationKind) -> Result<(), RemoteCallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let procedure = match kind {
            GenerationKind::Bom => "generate_bom",
            GenerationKind::CutList => "generate_cut_list",
        };

        if self.hold.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }

        let failure = self.failure.lock().unwrap().clone();
        if let Some(message) = failure {
            return Err(RemoteCallError::new(procedure, message));
        }

        if self.deferred.load(Ordering::SeqCst) {
            self.pending
                .lock()
                .unwrap()
                .push((order_id.to_string(), kind));
            return Ok(());
        }

        self.materialize(order_id, kind)
            .map_err(|e| RemoteCallError::new(procedure, e.to_string()))
    }

    // 创建/替换派生行
    fn materialize(&self, order_id: &str, kind: GenerationKind) -> RepositoryResult<()> {
        let tenant = self.tenant_id.as_str();
        let Some(order) = self.repos.order_repo.find_by_id(tenant, order_id)? else {
            return Ok(());
        };
        let now = Utc::now().naive_utc();

        match kind {
            GenerationKind::Bom => {
                let so_lines = self
                    .repos
                    .sale_order_line_repo
                    .list_by_sale_order(tenant, &order.sale_order_id)?;
                let so_line_ids: Vec<String> =
                    so_lines.iter().map(|l| l.line_id.clone()).collect();
                for old in self
                    .repos
                    .bom_repo
                    .list_instances_by_sale_order_lines(tenant, &so_line_ids)?
                {
                    self.repos
                        .bom_repo
                        .soft_delete_instance(tenant, &old.bom_instance_id)?;
                }

                for so_line in so_lines {
                    let instance = BomInstance {
                        bom_instance_id: format!("BOM-{}", Uuid::new_v4()),
                        tenant_id: tenant.to_string(),
                        sale_order_line_id: so_line.line_id.clone(),
                        is_deleted: false,
                        created_at: now,
                    };
                    self.repos.bom_repo.insert_instance(&instance)?;
                    for (role, qty, uom, cost) in [
                        ("fabric", 3.2, "m2", 18.0),
                        ("tube", 2.4, "m", 6.5),
                        ("motor", 1.0, "ea", 120.0),
                    ] {
                        let line = bom_line(
                            tenant,
                            &instance.bom_instance_id,
                            Some(role),
                            qty,
                            uom,
                            Some(cost),
                        );
                        self.repos.bom_repo.insert_line(&line)?;
                    }
                }
            }
            GenerationKind::CutList => {
                if let Some(old) = self.repos.cut_job_repo.find_latest_by_order(tenant, order_id)? {
                    self.repos.cut_job_repo.soft_delete_job(tenant, &old.cut_job_id)?;
                }
                let job = CutJob {
                    cut_job_id: format!("CJ-{}", Uuid::new_v4()),
                    tenant_id: tenant.to_string(),
                    order_id: order_id.to_string(),
                    status: "open".to_string(),
                    is_deleted: false,
                    created_at: now,
                };
                self.repos.cut_job_repo.insert_job(&job)?;
                for i in 0..self.cut_lines_per_job.load(Ordering::SeqCst) {
                    let line = cut_line(
                        tenant,
                        &job.cut_job_id,
                        Some("tube"),
                        1000.0 + 100.0 * i as f64,
                        2,
                    );
                    self.repos.cut_job_repo.insert_line(&line)?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteGenerator for MaterializingRemote {
    async fn generate_bom(&self, order_id: &str) -> Result<(), RemoteCallError> {
        self.handle(order_id, GenerationKind::Bom).await
    }

    async fn generate_cut_list(&self, order_id: &str) -> Result<(), RemoteCallError> {
        self.handle(order_id, GenerationKind::CutList).await
    }
}
