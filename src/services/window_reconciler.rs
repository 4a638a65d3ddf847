//! 窗口状态修复 - 业务能力层
//!
//! 维护“只剩主菜单窗口”这一状态。分三层：
//! 1. 原生关闭控件
//! 2. 统计窗口容器数量
//! 3. 直接删除第 0 个以外的窗口容器（最后手段，会绕过系统自身的清理逻辑）
//!
//! 本模块是唯一允许对页面做破坏性清理的地方。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{FrameRef, PageDriver};
use crate::models::selectors::{Selector, Selectors};
use crate::services::frame_locator::FrameLocator;

/// 一次清理的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// 只有主窗口，未做任何操作
    AlreadyClean,
    /// 原生关闭控件已恢复单窗口
    ClosedNatively,
    /// 通过强制删除恢复
    ForcedRemoval { removed: usize },
    /// 所有手段之后仍有多余窗口
    Dirty { remaining: usize },
}

impl ReconcileOutcome {
    pub fn is_clean(self) -> bool {
        !matches!(self, ReconcileOutcome::Dirty { .. })
    }
}

/// 窗口状态修复器
#[derive(Debug, Clone)]
pub struct WindowReconciler {
    locator: FrameLocator,
    window_container: Selector,
    close_controls: Vec<Selector>,
    form_marker: Selector,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl WindowReconciler {
    pub fn new(
        selectors: &Selectors,
        locator: FrameLocator,
        confirm_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            locator,
            window_container: selectors.window_container.clone(),
            close_controls: selectors.close_controls.clone(),
            form_marker: selectors.form_marker.clone(),
            confirm_timeout,
            poll_interval,
        }
    }

    /// 当前窗口容器数量（包含主窗口）
    pub async fn window_count(&self, driver: &dyn PageDriver) -> AppResult<usize> {
        driver.count(&FrameRef::main(), &self.window_container).await
    }

    /// 关闭所有非主窗口
    ///
    /// 部分失败不报错，只记录日志；残留窗口以 `Dirty` 返回，由调用方决定是否中止。
    /// 只有页面驱动本身失败（例如会话丢失）时才返回错误。
    pub async fn close_all_secondary_windows(
        &self,
        driver: &dyn PageDriver,
    ) -> AppResult<ReconcileOutcome> {
        let initial = self.window_count(driver).await?;
        if initial <= 1 {
            debug!("🪟 仅有主窗口，无需清理");
            return Ok(ReconcileOutcome::AlreadyClean);
        }
        info!("🧹 检测到 {} 个窗口，开始清理...", initial);

        // 第一层：原生关闭
        let native_closed = self.try_native_close(driver).await?;

        // 第二层：统计残留
        let remaining = self.window_count(driver).await?;
        if remaining <= 1 {
            info!("✓ 原生关闭完成");
            return Ok(ReconcileOutcome::ClosedNatively);
        }
        if native_closed {
            debug!("原生关闭后仍有 {} 个窗口", remaining);
        } else {
            warn!("⚠️ 原生关闭未生效，仍有 {} 个窗口", remaining);
        }

        // 第三层：强制删除
        let removed = self.force_remove_secondary_windows(driver).await?;

        let after = self.window_count(driver).await?;
        if after > 1 {
            warn!("{}", AppError::CleanupFailure { remaining: after });
            return Ok(ReconcileOutcome::Dirty { remaining: after });
        }
        Ok(ReconcileOutcome::ForcedRemoval { removed })
    }

    /// 直接删除第 0 个以外的所有窗口容器
    pub async fn force_remove_secondary_windows(&self, driver: &dyn PageDriver) -> AppResult<usize> {
        warn!("⚠️ 执行 JavaScript 强制清理窗口...");
        let removed = driver.remove_all_but_first(&self.window_container).await?;
        info!("✓ 强制删除了 {} 个窗口", removed);
        Ok(removed)
    }

    /// 依次尝试关闭控件，确认关闭后立即停止
    async fn try_native_close(&self, driver: &dyn PageDriver) -> AppResult<bool> {
        for selector in &self.close_controls {
            let targets = match self.locator.find_all_visible(driver, selector).await {
                Ok(t) => t,
                Err(e) if e.is_session_fatal() => return Err(e),
                Err(e) => {
                    debug!("扫描关闭控件 {} 失败: {}", selector, e);
                    continue;
                }
            };

            for target in targets {
                let before = self.window_count(driver).await?;
                match driver.click(&target, false).await {
                    Ok(()) => debug!("点击关闭控件 {}", target),
                    Err(e) if e.is_session_fatal() => return Err(e),
                    Err(e) => {
                        debug!("点击关闭控件 {} 失败: {}", target, e);
                        continue;
                    }
                }

                if self.confirm_closed(driver, before).await? {
                    info!("✓ 通过 {} 关闭了窗口", selector);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// 表单标志字段消失且窗口数减少，视为确认关闭
    async fn confirm_closed(&self, driver: &dyn PageDriver, before: usize) -> AppResult<bool> {
        let deadline = tokio::time::Instant::now() + self.confirm_timeout;
        loop {
            let marker_gone = !self.locator.exists_anywhere(driver, &self.form_marker).await?;
            if marker_gone && self.window_count(driver).await? < before {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(self.poll_interval).await;
        }
    }
}
