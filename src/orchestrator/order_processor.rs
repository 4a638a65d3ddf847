//! 工单批次处理器 - 编排层
//!
//! ## 职责
//!
//! 按表格顺序逐张处理工单，是工单级别的编排器。
//!
//! ## 单张工单的处理顺序
//!
//! 1. **前置清理**：清除上一张工单留下的窗口
//! 2. **搜索设备**
//! 3. **重复检查**：仅停用类工单；命中则计入跳过并清理窗口
//! 4. **提交**：委托 `OrderFlow`
//!
//! 单张工单的错误在这里被拦截（计数、截图、紧急清理），不会中断批次；
//! 只有会话级错误会继续向上传播。

use std::str::FromStr;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::{Config, Timings};
use crate::error::AppResult;
use crate::infrastructure::PageDriver;
use crate::models::selectors::Selectors;
use crate::models::WorkOrder;
use crate::services::{
    Diagnostics, DuplicateDetector, FailureStage, FrameLocator, ReconcileOutcome, WindowReconciler,
};
use crate::workflow::{OrderCtx, OrderFlow};

/// 工单失败后的窗口清理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStrategy {
    /// 逐层关闭窗口（原生关闭 → 强制删除）
    Teardown,
    /// 重新加载页面并等待网络空闲
    Reload,
}

impl FromStr for CleanupStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "teardown" => Ok(CleanupStrategy::Teardown),
            "reload" => Ok(CleanupStrategy::Reload),
            other => Err(format!("未知的清理方式: {}", other)),
        }
    }
}

/// 批次统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub succeeded: usize,
    /// 因重复检查而跳过
    pub skipped: usize,
    pub failed: usize,
}

impl BatchOutcome {
    /// 已处理总数
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

/// 单张工单的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderResult {
    Submitted,
    Skipped,
}

/// 工单批次处理器
#[derive(Debug, Clone)]
pub struct BatchRunner {
    flow: OrderFlow,
    reconciler: WindowReconciler,
    detector: DuplicateDetector,
    diagnostics: Diagnostics,
    strategy: CleanupStrategy,
    timings: Timings,
}

impl BatchRunner {
    pub fn new(config: &Config, selectors: &Selectors) -> Self {
        let timings = &config.timings;
        let locator = FrameLocator::new(timings.poll_interval);
        let reconciler = WindowReconciler::new(
            selectors,
            locator,
            timings.close_confirm_timeout,
            timings.poll_interval,
        );
        let diagnostics = Diagnostics::new(config.logs_dir());

        Self {
            flow: OrderFlow::new(selectors, timings, reconciler.clone(), diagnostics.clone()),
            detector: DuplicateDetector::new(selectors, config.duplicate_policy, timings.history_settle),
            reconciler,
            diagnostics,
            strategy: config.cleanup_strategy,
            timings: timings.clone(),
        }
    }

    /// 按顺序处理全部工单
    ///
    /// 只有会话级错误会返回 `Err`，此时批次中止。
    pub async fn run(&self, driver: &dyn PageDriver, orders: &[WorkOrder]) -> AppResult<BatchOutcome> {
        let total = orders.len();
        let mut outcome = BatchOutcome::default();

        for (i, order) in orders.iter().enumerate() {
            let ctx = OrderCtx::new(i + 1, total, order.tag.as_str());
            log_order_start(&ctx);

            match self.process_order(driver, order, &ctx).await {
                Ok(OrderResult::Submitted) => outcome.succeeded += 1,
                Ok(OrderResult::Skipped) => outcome.skipped += 1,
                Err(e) if e.is_session_fatal() => {
                    error!("{} 💥 浏览器会话丢失: {}", ctx, e);
                    return Err(e);
                }
                Err(e) => {
                    outcome.failed += 1;
                    error!("{} ❌ 处理失败: {}", ctx, e);
                    self.diagnostics
                        .capture(driver, FailureStage::Order, &order.tag)
                        .await;
                    self.emergency_cleanup(driver, &ctx).await?;
                }
            }

            log_running_status(&outcome);
            sleep(self.timings.between_orders).await;
        }

        Ok(outcome)
    }

    async fn process_order(
        &self,
        driver: &dyn PageDriver,
        order: &WorkOrder,
        ctx: &OrderCtx,
    ) -> AppResult<OrderResult> {
        info!("{} 🧹 前置清理...", ctx);
        self.cleanup_pass(driver, ctx).await?;

        self.flow.search(driver, order, ctx).await?;

        if order.is_deactivation() {
            info!("{} 🔎 停用类工单，检查重复...", ctx);
            if self.detector.has_existing_deactivation(driver).await? {
                warn!("{} ⏭️ 跳过: 已存在停用工单", ctx);
                self.cleanup_pass(driver, ctx).await?;
                return Ok(OrderResult::Skipped);
            }
        } else {
            debug!("{} 非停用类工单，跳过重复检查", ctx);
        }

        self.flow.submit(driver, order, ctx).await?;
        Ok(OrderResult::Submitted)
    }

    /// 清理窗口并等待窗口管理器完成销毁
    async fn cleanup_pass(&self, driver: &dyn PageDriver, ctx: &OrderCtx) -> AppResult<ReconcileOutcome> {
        let outcome = self.reconciler.close_all_secondary_windows(driver).await?;
        if !outcome.is_clean() {
            warn!("{} ⚠️ 窗口未能完全清理: {:?}", ctx, outcome);
        }
        if outcome != ReconcileOutcome::AlreadyClean {
            sleep(self.timings.cleanup_settle).await;
        }
        Ok(outcome)
    }

    /// 工单失败后的紧急清理；清理本身失败时直接强制删除
    async fn emergency_cleanup(&self, driver: &dyn PageDriver, ctx: &OrderCtx) -> AppResult<()> {
        warn!("{} 🧹 紧急清理 ({:?})...", ctx, self.strategy);

        let result = match self.strategy {
            CleanupStrategy::Teardown => self.cleanup_pass(driver, ctx).await.map(|_| ()),
            CleanupStrategy::Reload => self.reload(driver).await,
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_session_fatal() => Err(e),
            Err(e) => {
                error!("{} ❌ 紧急清理失败: {}", ctx, e);
                match self.reconciler.force_remove_secondary_windows(driver).await {
                    Ok(_) => Ok(()),
                    Err(e) if e.is_session_fatal() => Err(e),
                    Err(e) => {
                        error!("{} ❌ 强制清理失败: {}", ctx, e);
                        Ok(())
                    }
                }
            }
        }
    }

    async fn reload(&self, driver: &dyn PageDriver) -> AppResult<()> {
        driver.reload().await?;
        if !driver.wait_for_network_idle(self.timings.reload_idle_timeout).await {
            warn!("⚠️ 页面重载后等待网络空闲超时，继续执行");
        }
        Ok(())
    }
}

// ========== 日志辅助函数 ==========

fn log_order_start(ctx: &OrderCtx) {
    info!("\n{}", "─".repeat(60));
    info!("📌 工单 {}/{} | TAG: {}", ctx.index, ctx.total, ctx.tag);
    info!("{}", "─".repeat(60));
}

fn log_running_status(outcome: &BatchOutcome) {
    info!(
        "📊 当前状态: ✅ {} | ⏭️ {} | ❌ {}",
        outcome.succeeded, outcome.skipped, outcome.failed
    );
}
