// ==========================================
// 制造工单生命周期引擎 - 演示库生成
// ==========================================
// 用法: seed_demo_db [db_path]
// 场景:
//   MO-DEMO-001 draft, 3 行销售订单, 未生成 BOM
//   MO-DEMO-002 draft, BOM 已生成
//   MO-DEMO-003 planned, BOM + 下料单
//   MO-DEMO-004 in_production, BOM 明细已被清空
//   MO-DEMO-005 completed
// ==========================================

use chrono::{Duration, Local, NaiveDate, Utc};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use mo_lifecycle::app::get_default_db_path;
use mo_lifecycle::config::{config_keys, ConfigManager};
use mo_lifecycle::db::{init_schema, open_sqlite_connection};
use mo_lifecycle::engine::LifecycleRepositories;
use mo_lifecycle::{
    BomInstance, BomInstanceLine, CutJob, CutJobLine, ManufacturingOrder, OrderPriority,
    OrderStatus, SaleOrderLine,
};

const TENANT_ID: &str = "default";

// (part_role, description, qty, uom, unit_cost_exw)
const DEMO_BOM: [(&str, &str, f64, &str, f64); 6] = [
    ("fabric", "Blockout fabric 3000mm roll cut", 2.4, "m2", 18.5),
    ("tube", "Aluminium tube 45mm", 1.85, "m", 9.2),
    ("motor", "Tubular motor 10Nm", 1.0, "ea", 145.0),
    ("bracket", "End bracket pair", 1.0, "set", 12.0),
    ("bottom_bar", "Oval bottom bar", 1.8, "m", 6.4),
    ("accessory", "Chain tensioner", 1.0, "ea", 2.1),
];

// (part_role, description, cut_length_mm, quantity)
const DEMO_CUTS: [(&str, &str, f64, i32); 4] = [
    ("fabric", "Fabric drop", 2150.0, 1),
    ("tube", "Roller tube", 1812.0, 1),
    ("bottom_bar", "Bottom bar", 1795.0, 1),
    ("side_channel", "Side channel", 2100.0, 2),
];

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let repos = LifecycleRepositories::from_connection(conn.clone());
    let config = ConfigManager::from_connection(conn)
        .map_err(|e| format!("无法创建ConfigManager: {}", e))?;
    config
        .set_global_config_value(config_keys::COMPENSATION_DELAY_MS, "1500")
        .map_err(|e| format!("写入配置失败: {}", e))?;
    config
        .set_global_config_value(config_keys::DEFAULT_TENANT_ID, TENANT_ID)
        .map_err(|e| format!("写入配置失败: {}", e))?;

    let today = Local::now().date_naive();

    // 1. draft, 未生成 BOM
    let o1 = seed_order(&repos, 1, OrderStatus::Draft, OrderPriority::High, today)?;
    seed_sale_order_lines(&repos, &o1.sale_order_id, 3)?;

    // 2. draft, BOM 已生成
    let o2 = seed_order(&repos, 2, OrderStatus::Draft, OrderPriority::Normal, today)?;
    let lines = seed_sale_order_lines(&repos, &o2.sale_order_id, 2)?;
    seed_bom(&repos, &lines, true)?;

    // 3. planned, BOM + 下料单
    let o3 = seed_order(&repos, 3, OrderStatus::Planned, OrderPriority::Urgent, today)?;
    let lines = seed_sale_order_lines(&repos, &o3.sale_order_id, 1)?;
    seed_bom(&repos, &lines, true)?;
    seed_cut_job(&repos, &o3, &lines)?;

    // 4. in_production, BOM 明细已被清空
    let o4 = seed_order(&repos, 4, OrderStatus::InProduction, OrderPriority::Normal, today)?;
    let lines = seed_sale_order_lines(&repos, &o4.sale_order_id, 1)?;
    seed_bom(&repos, &lines, false)?;

    // 5. completed
    seed_order(&repos, 5, OrderStatus::Completed, OrderPriority::Low, today)?;

    let orders = repos.order_repo.list_by_status(TENANT_ID, None)?;
    println!("Seeded {} orders into {}", orders.len(), db_path);
    for o in orders {
        println!("  {} {:<14} {}", o.order_no, o.status.to_string(), o.order_id);
    }

    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_order(
    repos: &LifecycleRepositories,
    seq: u32,
    status: OrderStatus,
    priority: OrderPriority,
    today: NaiveDate,
) -> Result<ManufacturingOrder, Box<dyn Error>> {
    let now = Utc::now().naive_utc();
    let started = matches!(status, OrderStatus::InProduction | OrderStatus::Completed);

    let order = ManufacturingOrder {
        order_id: Uuid::new_v4().to_string(),
        tenant_id: TENANT_ID.to_string(),
        sale_order_id: format!("SO-DEMO-{:03}", seq),
        order_no: format!("MO-DEMO-{:03}", seq),
        status,
        priority,
        scheduled_start_date: Some(today + Duration::days(i64::from(seq))),
        scheduled_end_date: Some(today + Duration::days(i64::from(seq) + 5)),
        actual_start_date: if started { Some(today - Duration::days(3)) } else { None },
        actual_end_date: if status == OrderStatus::Completed { Some(today) } else { None },
        notes: None,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    };
    repos.order_repo.insert(&order)?;
    Ok(order)
}

fn seed_sale_order_lines(
    repos: &LifecycleRepositories,
    sale_order_id: &str,
    count: i32,
) -> Result<Vec<SaleOrderLine>, Box<dyn Error>> {
    let now = Utc::now().naive_utc();
    let mut out = Vec::new();
    for line_no in 1..=count {
        let line = SaleOrderLine {
            line_id: Uuid::new_v4().to_string(),
            tenant_id: TENANT_ID.to_string(),
            sale_order_id: sale_order_id.to_string(),
            line_no,
            product_name: format!("Roller blind #{}", line_no),
            quantity: 1.0,
            is_deleted: false,
            created_at: now,
        };
        repos.sale_order_line_repo.insert(&line)?;
        out.push(line);
    }
    Ok(out)
}

fn seed_bom(
    repos: &LifecycleRepositories,
    sale_order_lines: &[SaleOrderLine],
    with_lines: bool,
) -> Result<(), Box<dyn Error>> {
    let now = Utc::now().naive_utc();
    for so_line in sale_order_lines {
        let instance = BomInstance {
            bom_instance_id: Uuid::new_v4().to_string(),
            tenant_id: TENANT_ID.to_string(),
            sale_order_line_id: so_line.line_id.clone(),
            is_deleted: false,
            created_at: now,
        };
        repos.bom_repo.insert_instance(&instance)?;

        if !with_lines {
            continue;
        }
        for (role, description, qty, uom, unit_cost) in DEMO_BOM {
            repos.bom_repo.insert_line(&BomInstanceLine {
                line_id: Uuid::new_v4().to_string(),
                tenant_id: TENANT_ID.to_string(),
                bom_instance_id: instance.bom_instance_id.clone(),
                part_role: Some(role.to_string()),
                component_sku: None,
                description: description.to_string(),
                qty,
                uom: uom.to_string(),
                unit_cost_exw: Some(unit_cost),
                total_cost_exw: None,
                is_deleted: false,
                created_at: now,
            })?;
        }
    }
    Ok(())
}

fn seed_cut_job(
    repos: &LifecycleRepositories,
    order: &ManufacturingOrder,
    sale_order_lines: &[SaleOrderLine],
) -> Result<(), Box<dyn Error>> {
    let now = Utc::now().naive_utc();
    let job = CutJob {
        cut_job_id: Uuid::new_v4().to_string(),
        tenant_id: TENANT_ID.to_string(),
        order_id: order.order_id.clone(),
        status: "open".to_string(),
        is_deleted: false,
        created_at: now,
    };
    repos.cut_job_repo.insert_job(&job)?;

    for so_line in sale_order_lines {
        for (role, description, length_mm, quantity) in DEMO_CUTS {
            repos.cut_job_repo.insert_line(&CutJobLine {
                line_id: Uuid::new_v4().to_string(),
                tenant_id: TENANT_ID.to_string(),
                cut_job_id: job.cut_job_id.clone(),
                sale_order_line_id: Some(so_line.line_id.clone()),
                part_role: Some(role.to_string()),
                description: description.to_string(),
                cut_length_mm: length_mm,
                quantity,
                uom: "ea".to_string(),
                is_deleted: false,
                created_at: now,
            })?;
        }
    }
    Ok(())
}
