// ==========================================
// 可注入故障的 OrderStore 包装 - 用于集成测试
// ==========================================
// 默认全部透传；打开开关后派生明细读取、防呆链路读取或状态写入失败
// ==========================================

use async_trait::async_trait;
use mo_lifecycle::domain::bom::{BomInstance, BomInstanceLine, SaleOrderLine};
use mo_lifecycle::domain::cut_list::{CutJob, CutJobLine};
use mo_lifecycle::domain::order::{ManufacturingOrder, OrderDetailsPatch, OrderStatusPatch};
use mo_lifecycle::domain::types::OrderStatus;
use mo_lifecycle::engine::OrderStore;
use mo_lifecycle::repository::{RepositoryError, RepositoryResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub struct FlakyStore {
    inner: Arc<dyn OrderStore>,
    fail_line_reads: AtomicBool,
    fail_updates: AtomicBool,
    fail_chain_reads: AtomicBool,
    sale_order_line_reads: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn OrderStore>) -> Self {
        Self {
            inner,
            fail_line_reads: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
            fail_chain_reads: AtomicBool::new(false),
            sale_order_line_reads: AtomicUsize::new(0),
        }
    }

    pub fn set_fail_line_reads(&self, fail: bool) {
        self.fail_line_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// 防呆链路第一步（销售订单行）读取失败
    pub fn set_fail_chain_reads(&self, fail: bool) {
        self.fail_chain_reads.store(fail, Ordering::SeqCst);
    }

    /// 防呆链路第一步被执行的次数
    pub fn sale_order_line_reads(&self) -> usize {
        self.sale_order_line_reads.load(Ordering::SeqCst)
    }

    fn injected() -> RepositoryError {
        RepositoryError::DatabaseQueryError("injected read failure".to_string())
    }
}

#[async_trait]
impl OrderStore for FlakyStore {
    async fn find_order(
        &self,
        tenant_id: &str,
        order_id: &str,
    ) -> RepositoryResult<Option<ManufacturingOrder>> {
        self.inner.find_order(tenant_id, order_id).await
    }

    async fn list_sale_order_lines(
        &self,
        tenant_id: &str,
        sale_order_id: &str,
    ) -> RepositoryResult<Vec<SaleOrderLine>> {
        self.sale_order_line_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_chain_reads.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.list_sale_order_lines(tenant_id, sale_order_id).await
    }

    async fn list_bom_instances(
        &self,
        tenant_id: &str,
        sale_order_line_ids: &[String],
    ) -> RepositoryResult<Vec<BomInstance>> {
        self.inner.list_bom_instances(tenant_id, sale_order_line_ids).await
    }

    async fn exists_bom_instance_line(
        &self,
        tenant_id: &str,
        bom_instance_ids: &[String],
    ) -> RepositoryResult<bool> {
        self.inner
            .exists_bom_instance_line(tenant_id, bom_instance_ids)
            .await
    }

    async fn list_bom_instance_lines(
        &self,
        tenant_id: &str,
        bom_instance_ids: &[String],
    ) -> RepositoryResult<Vec<BomInstanceLine>> {
        if self.fail_line_reads.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner
            .list_bom_instance_lines(tenant_id, bom_instance_ids)
            .await
    }

    async fn find_cut_job(
        &self,
        tenant_id: &str,
        order_id: &str,
    ) -> RepositoryResult<Option<CutJob>> {
        self.inner.find_cut_job(tenant_id, order_id).await
    }

    async fn list_cut_job_lines(
        &self,
        tenant_id: &str,
        cut_job_id: &str,
    ) -> RepositoryResult<Vec<CutJobLine>> {
        if self.fail_line_reads.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.list_cut_job_lines(tenant_id, cut_job_id).await
    }

    async fn update_order(
        &self,
        tenant_id: &str,
        order_id: &str,
        patch: &OrderStatusPatch,
    ) -> RepositoryResult<ManufacturingOrder> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(RepositoryError::DatabaseQueryError(
                "injected write failure".to_string(),
            ));
        }
        self.inner.update_order(tenant_id, order_id, patch).await
    }

    async fn update_details(
        &self,
        tenant_id: &str,
        order_id: &str,
        patch: &OrderDetailsPatch,
    ) -> RepositoryResult<ManufacturingOrder> {
        self.inner.update_details(tenant_id, order_id, patch).await
    }

    async fn list_orders(
        &self,
        tenant_id: &str,
        status: Option<OrderStatus>,
    ) -> RepositoryResult<Vec<ManufacturingOrder>> {
        self.inner.list_orders(tenant_id, status).await
    }

    async fn archive_order(&self, tenant_id: &str, order_id: &str) -> RepositoryResult<()> {
        self.inner.archive_order(tenant_id, order_id).await
    }
}
