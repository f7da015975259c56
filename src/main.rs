// ==========================================
// 制造工单生命周期引擎 - 运维工具入口
// ==========================================
// 用法:
//   mo-lifecycle [db_path] readiness <tenant> <order_id>
//   mo-lifecycle [db_path] materials <tenant> <order_id>
//   mo-lifecycle [db_path] cut-list  <tenant> <order_id>
//   mo-lifecycle [db_path] list      <tenant> [status]
//   mo-lifecycle [db_path] advance   <tenant> <order_id> <status>
// 说明: advance 为显式命令，视为用户已确认
// 环境变量 MO_LIFECYCLE_LOG_FORMAT=json 时输出 JSON 行日志
// ==========================================

use anyhow::{anyhow, bail, Context};
use chrono::Local;

use mo_lifecycle::app::{get_default_db_path, AppState};
use mo_lifecycle::engine::TransitionOutcome;
use mo_lifecycle::{logging, OrderStatus};

const COMMANDS: [&str; 5] = ["readiness", "materials", "cut-list", "list", "advance"];

fn usage() -> String {
    format!(
        "用法: mo-lifecycle [db_path] <{}> <tenant> [order_id] [status]",
        COMMANDS.join("|")
    )
}

fn parse_status(raw: &str) -> anyhow::Result<OrderStatus> {
    OrderStatus::from_str(raw).ok_or_else(|| anyhow!("未知状态: {}", raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match std::env::var("MO_LIFECYCLE_LOG_FORMAT") {
        Ok(fmt) if fmt.eq_ignore_ascii_case("json") => logging::init_json(),
        _ => logging::init(),
    }

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    // 第一个参数不是命令时视为数据库路径
    let db_path = match args.first() {
        Some(first) if !COMMANDS.contains(&first.as_str()) => args.remove(0),
        _ => get_default_db_path(),
    };

    if args.is_empty() {
        bail!(usage());
    }
    let command = args.remove(0);

    tracing::info!("{} v{}", mo_lifecycle::APP_NAME, mo_lifecycle::VERSION);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path.clone())
        .await
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("初始化失败: {}", db_path))?;
    let api = state.lifecycle_api.clone();

    let tenant = match args.first() {
        Some(t) => t.clone(),
        None => state.default_tenant_id().await,
    };
    let order_id = args.get(1).cloned().unwrap_or_default();

    match command.as_str() {
        "readiness" => {
            let verdict = api.readiness(&tenant, &order_id).await?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        "materials" => {
            let summary = api.materials(&tenant, &order_id).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "cut-list" => {
            api.export_cut_list_csv(&tenant, &order_id, std::io::stdout())
                .await?;
        }
        "list" => {
            let status = match args.get(1) {
                Some(raw) => Some(parse_status(raw)?),
                None => None,
            };
            let rows = api.list_readiness(&tenant, status).await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        "advance" => {
            let raw = args.get(2).ok_or_else(|| anyhow!(usage()))?;
            let target = parse_status(raw)?;
            let today = Local::now().date_naive();
            match api.advance(&tenant, &order_id, target, today).await? {
                TransitionOutcome::Applied(order) => {
                    println!("{} → {}", order.order_no, order.status);
                }
                TransitionOutcome::Unchanged(order) => {
                    println!("{} 已处于 {}", order.order_no, order.status);
                }
                TransitionOutcome::Declined => println!("已取消"),
            }
        }
        other => bail!("未知命令: {}\n{}", other, usage()),
    }

    Ok(())
}
