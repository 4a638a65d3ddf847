//! 下拉框填写服务 - 业务能力层
//!
//! 只负责"按文字选中下拉项"能力，失败不中断工单

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::AppResult;
use crate::infrastructure::PageDriver;
use crate::models::selectors::Selector;
use crate::services::frame_locator::FrameLocator;

/// 第一个（去空白、转大写后）包含目标文字的选项，保留原始大小写
///
/// 目标为空时返回 `None`。
pub fn resolve_label(options: &[String], target: &str) -> Option<String> {
    let needle = target.trim().to_uppercase();
    if needle.is_empty() {
        return None;
    }
    options
        .iter()
        .find(|option| option.trim().to_uppercase().contains(&needle))
        .cloned()
}

/// 下拉框填写器
///
/// 职责：
/// - 等待控件出现并读取选项
/// - 模糊匹配，失败时按原文精确选择
/// - 仍失败则记录日志并继续
#[derive(Debug, Clone)]
pub struct DropdownFiller {
    locator: FrameLocator,
    timeout: Duration,
}

impl DropdownFiller {
    pub fn new(locator: FrameLocator, timeout: Duration) -> Self {
        Self { locator, timeout }
    }

    /// 选择下拉项，返回是否选中
    ///
    /// 只有会话级错误才会返回 `Err`。
    pub async fn select(
        &self,
        driver: &dyn PageDriver,
        field: &str,
        selector: &Selector,
        target: &str,
    ) -> AppResult<bool> {
        if target.trim().is_empty() {
            debug!("{} 为空，跳过", field);
            return Ok(false);
        }

        let Some(element) = self.locator.locate(driver, selector, self.timeout).await? else {
            warn!("⚠️ 下拉框 {} 未出现，跳过 '{}'", field, target);
            return Ok(false);
        };

        let options = match driver.option_labels(&element).await {
            Ok(options) => options,
            Err(e) if e.is_session_fatal() => return Err(e),
            Err(e) => {
                warn!("⚠️ 读取 {} 选项失败: {}", field, e);
                Vec::new()
            }
        };

        if let Some(label) = resolve_label(&options, target) {
            match driver.select_option(&element, &label).await {
                Ok(true) => {
                    debug!("✓ {} = '{}'", field, label);
                    return Ok(true);
                }
                Ok(false) => debug!("{} 选择 '{}' 未生效", field, label),
                Err(e) if e.is_session_fatal() => return Err(e),
                Err(e) => debug!("{} 选择 '{}' 失败: {}", field, label, e),
            }
        }

        // 精确匹配兜底
        match driver.select_option(&element, target).await {
            Ok(true) => {
                debug!("✓ {} = '{}' (精确匹配)", field, target);
                Ok(true)
            }
            Ok(false) => {
                warn!("⚠️ {} 中没有匹配 '{}' 的选项，跳过", field, target);
                Ok(false)
            }
            Err(e) if e.is_session_fatal() => Err(e),
            Err(e) => {
                warn!("⚠️ {} 选择 '{}' 失败，跳过: {}", field, target, e);
                Ok(false)
            }
        }
    }
}
