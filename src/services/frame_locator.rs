//! 跨 frame 元素定位 - 业务能力层
//!
//! 目标系统把表单放在动态创建的 iframe 里，frame 身份在会话之间不稳定，
//! 所以每次都按结构重新查找，不缓存 frame。

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::{ElementRef, FrameRef, PageDriver};
use crate::models::selectors::Selector;

/// 跨 frame 定位器
#[derive(Debug, Clone)]
pub struct FrameLocator {
    poll_interval: Duration,
}

impl FrameLocator {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// 在主文档和所有子 frame 中查找选择器
    ///
    /// 主文档的第一个匹配可见时直接返回；否则返回第一个至少有一个匹配的子 frame
    /// （不要求可见，由调用方决定）。超时返回 `None`，不视为错误。
    pub async fn locate(
        &self,
        driver: &dyn PageDriver,
        selector: &Selector,
        timeout: Duration,
    ) -> AppResult<Option<ElementRef>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(found) = self.locate_once(driver, selector).await? {
                return Ok(Some(found));
            }
            if Instant::now() >= deadline {
                debug!("未找到 {} (等待 {:?})", selector, timeout);
                return Ok(None);
            }
            sleep(self.poll_interval).await;
        }
    }

    /// 单次扫描
    pub async fn locate_once(
        &self,
        driver: &dyn PageDriver,
        selector: &Selector,
    ) -> AppResult<Option<ElementRef>> {
        let main = FrameRef::main();
        if driver.count(&main, selector).await? > 0 {
            let first = ElementRef::first(main, selector.clone());
            if driver.is_visible(&first).await? {
                return Ok(Some(first));
            }
        }

        for frame in driver.frames().await? {
            if frame.is_main() {
                continue;
            }
            if driver.count(&frame, selector).await? > 0 {
                debug!("在 {} 中找到 {}", frame, selector);
                return Ok(Some(ElementRef::first(frame, selector.clone())));
            }
        }
        Ok(None)
    }

    /// 所有 frame 中所有可见匹配
    pub async fn find_all_visible(
        &self,
        driver: &dyn PageDriver,
        selector: &Selector,
    ) -> AppResult<Vec<ElementRef>> {
        let mut visible = Vec::new();
        for frame in driver.frames().await? {
            let count = driver.count(&frame, selector).await?;
            for index in 0..count {
                let element = ElementRef::new(frame.clone(), selector.clone(), index);
                if driver.is_visible(&element).await? {
                    visible.push(element);
                }
            }
        }
        Ok(visible)
    }

    /// 任意 frame 中是否存在匹配
    pub async fn exists_anywhere(
        &self,
        driver: &dyn PageDriver,
        selector: &Selector,
    ) -> AppResult<bool> {
        for frame in driver.frames().await? {
            if driver.count(&frame, selector).await? > 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 轮询直到选择器在所有 frame 中都消失，超时返回 false
    pub async fn wait_until_gone(
        &self,
        driver: &dyn PageDriver,
        selector: &Selector,
        timeout: Duration,
    ) -> AppResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.exists_anywhere(driver, selector).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(self.poll_interval).await;
        }
    }
}
