// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::{NaiveDate, Utc};
use mo_lifecycle::domain::bom::{BomInstance, BomInstanceLine, SaleOrderLine};
use mo_lifecycle::domain::cut_list::{CutJob, CutJobLine};
use mo_lifecycle::domain::order::ManufacturingOrder;
use mo_lifecycle::domain::types::{OrderPriority, OrderStatus};
use mo_lifecycle::engine::LifecycleRepositories;
use uuid::Uuid;

// ==========================================
// ManufacturingOrder 构建器
// ==========================================

pub struct OrderBuilder {
    order_id: String,
    tenant_id: String,
    sale_order_id: String,
    order_no: String,
    status: OrderStatus,
    priority: OrderPriority,
    scheduled_start_date: Option<NaiveDate>,
    scheduled_end_date: Option<NaiveDate>,
    actual_start_date: Option<NaiveDate>,
    notes: Option<String>,
}

impl OrderBuilder {
    pub fn new(order_id: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            tenant_id: "t1".to_string(),
            sale_order_id: format!("SO-{}", order_id),
            order_no: format!("NO-{}", order_id),
            status: OrderStatus::Draft,
            priority: OrderPriority::Normal,
            scheduled_start_date: None,
            scheduled_end_date: None,
            actual_start_date: None,
            notes: None,
        }
    }

    pub fn tenant(mut self, tenant_id: &str) -> Self {
        self.tenant_id = tenant_id.to_string();
        self
    }

    pub fn sale_order(mut self, sale_order_id: &str) -> Self {
        self.sale_order_id = sale_order_id.to_string();
        self
    }

    pub fn order_no(mut self, order_no: &str) -> Self {
        self.order_no = order_no.to_string();
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn priority(mut self, priority: OrderPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn scheduled(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.scheduled_start_date = start;
        self.scheduled_end_date = end;
        self
    }

    pub fn actual_start(mut self, date: NaiveDate) -> Self {
        self.actual_start_date = Some(date);
        self
    }

    pub fn notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn build(self) -> ManufacturingOrder {
        let now = Utc::now().naive_utc();
        ManufacturingOrder {
            order_id: self.order_id,
            tenant_id: self.tenant_id,
            sale_order_id: self.sale_order_id,
            order_no: self.order_no,
            status: self.status,
            priority: self.priority,
            scheduled_start_date: self.scheduled_start_date,
            scheduled_end_date: self.scheduled_end_date,
            actual_start_date: self.actual_start_date,
            actual_end_date: None,
            notes: self.notes,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// 构建并落库
    pub fn insert(self, repos: &LifecycleRepositories) -> ManufacturingOrder {
        let order = self.build();
        repos.order_repo.insert(&order).unwrap();
        order
    }
}

// ==========================================
// 链路数据
// ==========================================

fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// 为销售订单插入 n 行
pub fn seed_sale_order_lines(
    repos: &LifecycleRepositories,
    tenant_id: &str,
    sale_order_id: &str,
    n: usize,
) -> Vec<SaleOrderLine> {
    (0..n)
        .map(|i| {
            let line = SaleOrderLine {
                line_id: new_id("SOL"),
                tenant_id: tenant_id.to_string(),
                sale_order_id: sale_order_id.to_string(),
                line_no: (i + 1) as i32,
                product_name: format!("卷帘 {}", i + 1),
                quantity: 1.0,
                is_deleted: false,
                created_at: Utc::now().naive_utc(),
            };
            repos.sale_order_line_repo.insert(&line).unwrap();
            line
        })
        .collect()
}

pub fn seed_bom_instance(
    repos: &LifecycleRepositories,
    tenant_id: &str,
    sale_order_line_id: &str,
) -> BomInstance {
    let instance = BomInstance {
        bom_instance_id: new_id("BOM"),
        tenant_id: tenant_id.to_string(),
        sale_order_line_id: sale_order_line_id.to_string(),
        is_deleted: false,
        created_at: Utc::now().naive_utc(),
    };
    repos.bom_repo.insert_instance(&instance).unwrap();
    instance
}

pub fn bom_line(
    tenant_id: &str,
    bom_instance_id: &str,
    role: Option<&str>,
    qty: f64,
    uom: &str,
    unit_cost: Option<f64>,
) -> BomInstanceLine {
    BomInstanceLine {
        line_id: new_id("BOML"),
        tenant_id: tenant_id.to_string(),
        bom_instance_id: bom_instance_id.to_string(),
        part_role: role.map(|r| r.to_string()),
        component_sku: None,
        description: format!("{} 组件", role.unwrap_or("未分类")),
        qty,
        uom: uom.to_string(),
        unit_cost_exw: unit_cost,
        total_cost_exw: None,
        is_deleted: false,
        created_at: Utc::now().naive_utc(),
    }
}

pub fn seed_bom_line(
    repos: &LifecycleRepositories,
    tenant_id: &str,
    bom_instance_id: &str,
    role: Option<&str>,
    qty: f64,
    uom: &str,
    unit_cost: Option<f64>,
) -> BomInstanceLine {
    let line = bom_line(tenant_id, bom_instance_id, role, qty, uom, unit_cost);
    repos.bom_repo.insert_line(&line).unwrap();
    line
}

/// 一步到位: n 行销售订单行，每行一个 BOM 实例 + 一条 fabric 明细
pub fn seed_full_bom(
    repos: &LifecycleRepositories,
    order: &ManufacturingOrder,
    n: usize,
) -> Vec<BomInstanceLine> {
    seed_sale_order_lines(repos, &order.tenant_id, &order.sale_order_id, n)
        .iter()
        .map(|so_line| {
            let instance = seed_bom_instance(repos, &order.tenant_id, &so_line.line_id);
            seed_bom_line(
                repos,
                &order.tenant_id,
                &instance.bom_instance_id,
                Some("fabric"),
                2.5,
                "m",
                Some(10.0),
            )
        })
        .collect()
}

pub fn seed_cut_job(repos: &LifecycleRepositories, order: &ManufacturingOrder) -> CutJob {
    let job = CutJob {
        cut_job_id: new_id("CJ"),
        tenant_id: order.tenant_id.clone(),
        order_id: order.order_id.clone(),
        status: "open".to_string(),
        is_deleted: false,
        created_at: Utc::now().naive_utc(),
    };
    repos.cut_job_repo.insert_job(&job).unwrap();
    job
}

pub fn cut_line(
    tenant_id: &str,
    cut_job_id: &str,
    role: Option<&str>,
    cut_length_mm: f64,
    quantity: i32,
) -> CutJobLine {
    CutJobLine {
        line_id: new_id("CJL"),
        tenant_id: tenant_id.to_string(),
        cut_job_id: cut_job_id.to_string(),
        sale_order_line_id: None,
        part_role: role.map(|r| r.to_string()),
        description: format!("{} {}mm", role.unwrap_or("未分类"), cut_length_mm),
        cut_length_mm,
        quantity,
        uom: "mm".to_string(),
        is_deleted: false,
        created_at: Utc::now().naive_utc(),
    }
}

pub fn seed_cut_line(
    repos: &LifecycleRepositories,
    job: &CutJob,
    role: Option<&str>,
    cut_length_mm: f64,
    quantity: i32,
) -> CutJobLine {
    let line = cut_line(&job.tenant_id, &job.cut_job_id, role, cut_length_mm, quantity);
    repos.cut_job_repo.insert_line(&line).unwrap();
    line
}
