// ==========================================
// 制造工单生命周期引擎 - 引擎层仓储端口
// ==========================================
// 职责: 定义引擎消费的查询/写入契约 (OrderStore)，
//       并用 SQLite 仓储聚合实现之
// 约束: 所有查询租户隔离、排除软删除行
// 红线: 防呆校验与仓储之间不允许插入缓存层
// ==========================================

use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::domain::bom::{BomInstance, BomInstanceLine, SaleOrderLine};
use crate::domain::cut_list::{CutJob, CutJobLine};
use crate::domain::order::{ManufacturingOrder, OrderDetailsPatch, OrderStatusPatch};
use crate::domain::types::OrderStatus;
use crate::repository::{
    BomRepository, CutJobRepository, ManufacturingOrderRepository, RepositoryResult,
    SaleOrderLineRepository,
};

// ==========================================
// OrderStore Trait
// ==========================================

/// 工单数据源
///
/// 引擎层定义，仓储层适配；测试中可整体替换为内存实现
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_order(
        &self,
        tenant_id: &str,
        order_id: &str,
    ) -> RepositoryResult<Option<ManufacturingOrder>>;

    async fn list_sale_order_lines(
        &self,
        tenant_id: &str,
        sale_order_id: &str,
    ) -> RepositoryResult<Vec<SaleOrderLine>>;

    async fn list_bom_instances(
        &self,
        tenant_id: &str,
        sale_order_line_ids: &[String],
    ) -> RepositoryResult<Vec<BomInstance>>;

    /// 存在性检查，不做全量读取
    async fn exists_bom_instance_line(
        &self,
        tenant_id: &str,
        bom_instance_ids: &[String],
    ) -> RepositoryResult<bool>;

    async fn list_bom_instance_lines(
        &self,
        tenant_id: &str,
        bom_instance_ids: &[String],
    ) -> RepositoryResult<Vec<BomInstanceLine>>;

    /// 工单当前有效的下料任务（最新一条）
    async fn find_cut_job(
        &self,
        tenant_id: &str,
        order_id: &str,
    ) -> RepositoryResult<Option<CutJob>>;

    async fn list_cut_job_lines(
        &self,
        tenant_id: &str,
        cut_job_id: &str,
    ) -> RepositoryResult<Vec<CutJobLine>>;

    /// 状态及派生日期落库，返回落库后的工单
    async fn update_order(
        &self,
        tenant_id: &str,
        order_id: &str,
        patch: &OrderStatusPatch,
    ) -> RepositoryResult<ManufacturingOrder>;

    /// 非状态字段编辑
    async fn update_details(
        &self,
        tenant_id: &str,
        order_id: &str,
        patch: &OrderDetailsPatch,
    ) -> RepositoryResult<ManufacturingOrder>;

    /// 按状态列出工单
    async fn list_orders(
        &self,
        tenant_id: &str,
        status: Option<OrderStatus>,
    ) -> RepositoryResult<Vec<ManufacturingOrder>>;

    async fn archive_order(&self, tenant_id: &str, order_id: &str) -> RepositoryResult<()>;
}

// ==========================================
// LifecycleRepositories - SQLite 仓储聚合
// ==========================================

/// 生命周期引擎仓储集合
///
/// # 包含的仓储
/// - `order_repo`: 制造工单
/// - `sale_order_line_repo`: 销售订单行
/// - `bom_repo`: BOM 实例与明细
/// - `cut_job_repo`: 下料任务与明细
#[derive(Clone)]
pub struct LifecycleRepositories {
    pub order_repo: Arc<ManufacturingOrderRepository>,
    pub sale_order_line_repo: Arc<SaleOrderLineRepository>,
    pub bom_repo: Arc<BomRepository>,
    pub cut_job_repo: Arc<CutJobRepository>,
}

impl LifecycleRepositories {
    pub fn new(
        order_repo: Arc<ManufacturingOrderRepository>,
        sale_order_line_repo: Arc<SaleOrderLineRepository>,
        bom_repo: Arc<BomRepository>,
        cut_job_repo: Arc<CutJobRepository>,
    ) -> Self {
        Self {
            order_repo,
            sale_order_line_repo,
            bom_repo,
            cut_job_repo,
        }
    }

    /// 所有仓储共享同一连接
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            order_repo: Arc::new(ManufacturingOrderRepository::from_connection(conn.clone())),
            sale_order_line_repo: Arc::new(SaleOrderLineRepository::from_connection(conn.clone())),
            bom_repo: Arc::new(BomRepository::from_connection(conn.clone())),
            cut_job_repo: Arc::new(CutJobRepository::from_connection(conn)),
        }
    }
}

#[async_trait]
impl OrderStore for LifecycleRepositories {
    async fn find_order(
        &self,
        tenant_id: &str,
        order_id: &str,
    ) -> RepositoryResult<Option<ManufacturingOrder>> {
        self.order_repo.find_by_id(tenant_id, order_id)
    }

    async fn list_sale_order_lines(
        &self,
        tenant_id: &str,
        sale_order_id: &str,
    ) -> RepositoryResult<Vec<SaleOrderLine>> {
        self.sale_order_line_repo
            .list_by_sale_order(tenant_id, sale_order_id)
    }

    async fn list_bom_instances(
        &self,
        tenant_id: &str,
        sale_order_line_ids: &[String],
    ) -> RepositoryResult<Vec<BomInstance>> {
        self.bom_repo
            .list_instances_by_sale_order_lines(tenant_id, sale_order_line_ids)
    }

    async fn exists_bom_instance_line(
        &self,
        tenant_id: &str,
        bom_instance_ids: &[String],
    ) -> RepositoryResult<bool> {
        self.bom_repo.exists_line(tenant_id, bom_instance_ids)
    }

    async fn list_bom_instance_lines(
        &self,
        tenant_id: &str,
        bom_instance_ids: &[String],
    ) -> RepositoryResult<Vec<BomInstanceLine>> {
        self.bom_repo.list_lines(tenant_id, bom_instance_ids)
    }

    async fn find_cut_job(
        &self,
        tenant_id: &str,
        order_id: &str,
    ) -> RepositoryResult<Option<CutJob>> {
        self.cut_job_repo.find_latest_by_order(tenant_id, order_id)
    }

    async fn list_cut_job_lines(
        &self,
        tenant_id: &str,
        cut_job_id: &str,
    ) -> RepositoryResult<Vec<CutJobLine>> {
        self.cut_job_repo.list_lines(tenant_id, cut_job_id)
    }

    async fn update_order(
        &self,
        tenant_id: &str,
        order_id: &str,
        patch: &OrderStatusPatch,
    ) -> RepositoryResult<ManufacturingOrder> {
        self.order_repo.update_status(tenant_id, order_id, patch)
    }

    async fn update_details(
        &self,
        tenant_id: &str,
        order_id: &str,
        patch: &OrderDetailsPatch,
    ) -> RepositoryResult<ManufacturingOrder> {
        self.order_repo.update_details(tenant_id, order_id, patch)
    }

    async fn list_orders(
        &self,
        tenant_id: &str,
        status: Option<OrderStatus>,
    ) -> RepositoryResult<Vec<ManufacturingOrder>> {
        self.order_repo.list_by_status(tenant_id, status)
    }

    async fn archive_order(&self, tenant_id: &str, order_id: &str) -> RepositoryResult<()> {
        self.order_repo.soft_delete(tenant_id, order_id)
    }
}

// ==========================================
// 链路读取辅助
// ==========================================

/// 沿 SaleOrderLine → BomInstance → BomInstanceLine 读取工单的全部 BOM 明细
pub async fn load_bom_lines(
    store: &dyn OrderStore,
    order: &ManufacturingOrder,
) -> RepositoryResult<Vec<BomInstanceLine>> {
    let so_lines = store
        .list_sale_order_lines(&order.tenant_id, &order.sale_order_id)
        .await?;
    let so_line_ids: Vec<String> = so_lines.into_iter().map(|l| l.line_id).collect();

    let instances = store
        .list_bom_instances(&order.tenant_id, &so_line_ids)
        .await?;
    let instance_ids: Vec<String> = instances.into_iter().map(|i| i.bom_instance_id).collect();

    store
        .list_bom_instance_lines(&order.tenant_id, &instance_ids)
        .await
}

/// 读取工单当前下料任务及其明细
pub async fn load_cut_job_lines(
    store: &dyn OrderStore,
    order: &ManufacturingOrder,
) -> RepositoryResult<(Option<CutJob>, Vec<CutJobLine>)> {
    let job = store.find_cut_job(&order.tenant_id, &order.order_id).await?;
    match job {
        Some(job) => {
            let lines = store
                .list_cut_job_lines(&order.tenant_id, &job.cut_job_id)
                .await?;
            Ok((Some(job), lines))
        }
        None => Ok((None, vec![])),
    }
}
