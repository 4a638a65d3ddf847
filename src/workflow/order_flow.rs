//! 工单提交流程 - 流程层
//!
//! 核心职责：定义"一张工单"从搜索到窗口关闭的完整步骤
//!
//! 流程顺序：
//! 1. Searching       搜索设备
//! 2. FormOpening     打开工单表单
//! 3. FormFilling     填写表单（失败时截图）
//! 4. Saving          保存
//! 5. ClosingWindow   关闭表单窗口（必要时强制删除）
//! 6. Stabilizing     等待关闭动画
//! 7. SanitizingFocus 点击空白处清除残留焦点
//!
//! 任一步骤出错即进入 Failed，错误交给编排层处理。
//!
//! 搜索与后续步骤之间由编排层插入重复检查。

use std::fmt;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Timings;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{ElementRef, Key, PageDriver};
use crate::models::selectors::{Selector, Selectors};
use crate::models::{CloseDate, WorkOrder};
use crate::services::{AssetSearch, Diagnostics, DropdownFiller, FailureStage, FrameLocator, WindowReconciler};
use crate::workflow::order_ctx::OrderCtx;

/// 清除焦点时点击的空白坐标
const NEUTRAL_POINT: (f64, f64) = (5.0, 5.0);

/// 提交步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Searching,
    FormOpening,
    FormFilling,
    Saving,
    ClosingWindow,
    Stabilizing,
    SanitizingFocus,
    Done,
    /// 终止状态，不再继续任何步骤
    Failed,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionStage::Searching => "Searching",
            SubmissionStage::FormOpening => "FormOpening",
            SubmissionStage::FormFilling => "FormFilling",
            SubmissionStage::Saving => "Saving",
            SubmissionStage::ClosingWindow => "ClosingWindow",
            SubmissionStage::Stabilizing => "Stabilizing",
            SubmissionStage::SanitizingFocus => "SanitizingFocus",
            SubmissionStage::Done => "Done",
            SubmissionStage::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// 工单提交流程
///
/// - 编排单张工单的提交步骤
/// - 不持有页面，页面由调用方传入
/// - 只依赖业务能力（services）
#[derive(Debug, Clone)]
pub struct OrderFlow {
    selectors: Selectors,
    timings: Timings,
    locator: FrameLocator,
    search: AssetSearch,
    dropdown: DropdownFiller,
    reconciler: WindowReconciler,
    diagnostics: Diagnostics,
}

impl OrderFlow {
    pub fn new(
        selectors: &Selectors,
        timings: &Timings,
        reconciler: WindowReconciler,
        diagnostics: Diagnostics,
    ) -> Self {
        let locator = FrameLocator::new(timings.poll_interval);
        Self {
            selectors: selectors.clone(),
            timings: timings.clone(),
            search: AssetSearch::new(
                locator.clone(),
                selectors.asset_search_input.clone(),
                timings.search_input_timeout,
                timings.network_idle_timeout,
                timings.search_settle,
            ),
            dropdown: DropdownFiller::new(locator.clone(), timings.element_timeout),
            locator,
            reconciler,
            diagnostics,
        }
    }

    /// Searching：搜索设备
    pub async fn search(&self, driver: &dyn PageDriver, order: &WorkOrder, ctx: &OrderCtx) -> AppResult<()> {
        self.enter(ctx, SubmissionStage::Searching);
        self.search
            .search(driver, &order.tag)
            .await
            .inspect_err(|e| self.fail(ctx, e))
    }

    /// FormOpening → Done：打开、填写、保存并关闭工单表单
    pub async fn submit(&self, driver: &dyn PageDriver, order: &WorkOrder, ctx: &OrderCtx) -> AppResult<()> {
        self.run_steps(driver, order, ctx)
            .await
            .inspect_err(|e| self.fail(ctx, e))
    }

    async fn run_steps(&self, driver: &dyn PageDriver, order: &WorkOrder, ctx: &OrderCtx) -> AppResult<()> {
        // ========== FormOpening ==========
        self.enter(ctx, SubmissionStage::FormOpening);
        self.open_form(driver).await?;

        // ========== FormFilling ==========
        self.enter(ctx, SubmissionStage::FormFilling);
        info!("{} 📝 填写工单 | 标准: {}", ctx, order.standard);
        if let Err(e) = self.fill_form(driver, order).await {
            error!("{} ❌ 表单填写失败: {}", ctx, e);
            self.diagnostics
                .capture(driver, FailureStage::Filling, &order.tag)
                .await;
            return Err(e);
        }

        // ========== Saving ==========
        self.enter(ctx, SubmissionStage::Saving);
        self.save(driver).await?;

        // ========== ClosingWindow ==========
        self.enter(ctx, SubmissionStage::ClosingWindow);
        self.close_form(driver, ctx).await?;

        // ========== Stabilizing ==========
        self.enter(ctx, SubmissionStage::Stabilizing);
        // 关闭动画没有完成事件
        sleep(self.timings.stabilize).await;

        // ========== SanitizingFocus ==========
        self.enter(ctx, SubmissionStage::SanitizingFocus);
        let (x, y) = NEUTRAL_POINT;
        if let Err(e) = driver.click_at(x, y).await {
            if e.is_session_fatal() {
                return Err(e);
            }
            warn!("{} ⚠️ 清除焦点失败: {}", ctx, e);
        }

        self.enter(ctx, SubmissionStage::Done);
        info!("{} ✓ 工单已保存", ctx);
        Ok(())
    }

    fn enter(&self, ctx: &OrderCtx, stage: SubmissionStage) {
        debug!("{} → {}", ctx, stage);
    }

    fn fail(&self, ctx: &OrderCtx, e: &AppError) {
        debug!("{} → {} ({})", ctx, SubmissionStage::Failed, e);
    }

    // ========== 各步骤实现 ==========

    async fn open_form(&self, driver: &dyn PageDriver) -> AppResult<()> {
        let button = match self
            .locator
            .locate(driver, &self.selectors.open_order_button, self.timings.element_timeout)
            .await?
        {
            Some(button) => button,
            None => {
                debug!("按 id 未找到打开按钮，按文本查找");
                self.locator
                    .locate_once(driver, &self.selectors.open_order_text)
                    .await?
                    .ok_or_else(|| AppError::not_found(&self.selectors.open_order_button, "打开工单按钮"))?
            }
        };

        if !driver.is_enabled(&button).await? {
            return Err(AppError::DisabledControl { control: "打开工单" });
        }
        driver.click(&button, true).await?;

        let opened = self
            .locator
            .locate(driver, &self.selectors.form_marker, self.timings.form_open_timeout)
            .await?;
        if opened.is_none() {
            return Err(AppError::FormTimeout {
                stage: "FormOpening",
                timeout: self.timings.form_open_timeout,
            });
        }
        info!("✓ 工单表单已打开");
        Ok(())
    }

    async fn fill_form(&self, driver: &dyn PageDriver, order: &WorkOrder) -> AppResult<()> {
        let s = &self.selectors;

        // 日期与时间
        let start_date = self.require(driver, &s.start_date_input, "开单日期").await?;
        driver.fill(&start_date, &order.start_date.to_form_value()).await?;
        let start_time = self.require(driver, &s.start_time_input, "开单时间").await?;
        driver.fill(&start_time, &order.start_time.to_form_value()).await?;
        // 离开时间字段触发系统自身的校验
        driver.press(&start_time, Key::Tab).await?;

        // 分类下拉框
        let dropdowns: [(&str, &Selector, &str); 6] = [
            ("工场", &s.shop_select, &order.shop_type),
            ("工单类型", &s.order_type_select, &order.order_type),
            ("复杂度", &s.complexity_select, &order.complexity),
            ("报告人", &s.reported_by_select, &order.reported_by),
            ("事件类型", &s.occurrence_type_select, &order.occurrence_type),
            ("事件原因", &s.occurrence_cause_select, &order.occurrence_cause),
        ];
        for (field, selector, value) in dropdowns {
            self.dropdown.select(driver, field, selector, value).await?;
        }

        if !order.notes.is_empty() {
            let notes = self.require(driver, &s.notes_input, "备注").await?;
            driver.fill(&notes, &order.notes).await?;
        }

        // 关闭日期
        match &order.close_date {
            CloseDate::Now => {
                info!("⏱️ 点击“立即关闭”");
                let button = self.require(driver, &s.close_now_button, "立即关闭").await?;
                driver.click(&button, false).await?;
                // 系统自行填写关闭日期，没有事件
                sleep(self.timings.close_now_settle).await;
            }
            CloseDate::On(date) => {
                self.fill_optional(driver, &s.close_date_input, &date.to_form_value())
                    .await?;
                if let Some(time) = &order.close_time {
                    self.fill_optional(driver, &s.close_time_input, &time.to_form_value())
                        .await?;
                }
            }
        }

        // 人工完成勾选框：只在状态不一致时点击
        let labor = self.require(driver, &s.labor_checkbox, "人工完成").await?;
        if driver.is_checked(&labor).await? != order.labor_completed {
            debug!("切换人工完成 -> {}", order.labor_completed);
            driver.click(&labor, false).await?;
        }

        self.dropdown
            .select(driver, "技术员", &s.technician_select, &order.technician)
            .await?;
        self.dropdown
            .select(driver, "服务", &s.service_select, &order.service_description)
            .await?;

        Ok(())
    }

    async fn save(&self, driver: &dyn PageDriver) -> AppResult<()> {
        for selector in &self.selectors.save_buttons {
            let Some(button) = self.locator.locate_once(driver, selector).await? else {
                continue;
            };
            if !driver.is_visible(&button).await? {
                continue;
            }
            if !driver.is_enabled(&button).await? {
                return Err(AppError::DisabledControl { control: "保存" });
            }
            driver.click(&button, false).await?;
            info!("💾 已点击保存");
            return Ok(());
        }

        let first = self
            .selectors
            .save_buttons
            .first()
            .cloned()
            .unwrap_or_else(|| Selector::text("Salvar"));
        Err(AppError::not_found(&first, "保存按钮"))
    }

    /// 保存后表单应自行关闭；否则依次尝试关闭控件，最后强制删除
    async fn close_form(&self, driver: &dyn PageDriver, ctx: &OrderCtx) -> AppResult<()> {
        let marker = &self.selectors.form_marker;
        if self
            .locator
            .wait_until_gone(driver, marker, self.timings.save_close_timeout)
            .await?
        {
            debug!("{} 表单已自行关闭", ctx);
            return Ok(());
        }

        for selector in &self.selectors.order_close_controls {
            for target in self.locator.find_all_visible(driver, selector).await? {
                match driver.click(&target, false).await {
                    Ok(()) => {}
                    Err(e) if e.is_session_fatal() => return Err(e),
                    Err(e) => {
                        debug!("{} 点击 {} 失败: {}", ctx, target, e);
                        continue;
                    }
                }
                if self
                    .locator
                    .wait_until_gone(driver, marker, self.timings.close_confirm_timeout)
                    .await?
                {
                    info!("{} ✓ 通过 {} 关闭了表单", ctx, selector);
                    return Ok(());
                }
            }
        }

        warn!("{} ⚠️ 关闭控件均未生效，强制删除窗口", ctx);
        self.reconciler.force_remove_secondary_windows(driver).await?;

        if self.locator.exists_anywhere(driver, marker).await? {
            return Err(AppError::FormTimeout {
                stage: "ClosingWindow",
                timeout: self.timings.save_close_timeout,
            });
        }
        Ok(())
    }

    // ========== 辅助方法 ==========

    async fn require(
        &self,
        driver: &dyn PageDriver,
        selector: &Selector,
        context: &'static str,
    ) -> AppResult<ElementRef> {
        self.locator
            .locate(driver, selector, self.timings.element_timeout)
            .await?
            .ok_or_else(|| AppError::not_found(selector, context))
    }

    /// 字段不存在时跳过
    async fn fill_optional(&self, driver: &dyn PageDriver, selector: &Selector, value: &str) -> AppResult<()> {
        match self.locator.locate_once(driver, selector).await? {
            Some(field) => driver.fill(&field, value).await,
            None => {
                debug!("表单中没有 {}，跳过", selector);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_match_log_output() {
        assert_eq!(SubmissionStage::FormFilling.to_string(), "FormFilling");
        assert_eq!(SubmissionStage::SanitizingFocus.to_string(), "SanitizingFocus");
        assert_eq!(SubmissionStage::Failed.to_string(), "Failed");
    }
}
