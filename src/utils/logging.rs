/// 日志工具模块
///
/// 初始化控制台与滚动文件日志，并提供批次报告的格式化输出
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::orchestrator::BatchOutcome;

/// 保留的日志文件数量
const MAX_LOG_FILES: usize = 7;

/// 初始化日志
///
/// 控制台与 `logs/execution.log`（按天滚动）同时输出。
/// `RUST_LOG` 优先；否则 `verbose` 为 true 时使用 debug 级别。
/// 返回的 guard 必须存活到程序结束，否则文件日志会丢失。
pub fn init(logs_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("无法创建日志目录: {}", logs_dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("execution")
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(logs_dir)
        .context("无法创建滚动日志文件")?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},chromiumoxide=warn,tungstenite=warn",
            default_level
        ))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .context("日志系统已初始化")?;

    Ok(guard)
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - Neovero 工单自动录入");
    info!("🌐 目标地址: {}", config.neovero_url);
    match config.browser_debug_port {
        Some(port) => info!("🔗 连接已有浏览器 (端口 {})", port),
        None => info!("🖥️ 启动新浏览器 (无头模式: {})", config.headless),
    }
    info!(
        "🧹 清理方式: {:?} | 重复判定: {:?}",
        config.cleanup_strategy, config.duplicate_policy
    );
    info!("{}", "=".repeat(60));
}

/// 记录工单加载信息
pub fn log_orders_loaded(total: usize, input: &Path) {
    info!("✓ 从 {} 读取到 {} 张工单", input.display(), total);
    info!("\n{}", "=".repeat(60));
    info!("🔄 开始处理 {} 张工单", total);
    info!("{}", "=".repeat(60));
}

/// 打印最终报告
pub fn log_final_report(outcome: &BatchOutcome, loaded: usize, logs_dir: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📋 执行报告");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}", outcome.succeeded);
    info!("⏭️ 跳过 (重复): {}", outcome.skipped);
    info!("❌ 失败: {}", outcome.failed);
    info!("📊 已处理: {}/{}", outcome.total(), loaded);
    info!("{}", "=".repeat(60));

    if outcome.failed == 0 {
        info!("🎉 全部完成，没有失败");
    } else {
        warn!(
            "⚠️ 完成，但有 {} 张工单失败，请查看日志与截图: {}",
            outcome.failed,
            logs_dir.display()
        );
    }
}
