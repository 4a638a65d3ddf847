//! 设备搜索服务 - 业务能力层
//!
//! 只负责"在侧边栏输入 TAG 并回车"能力，不关心流程

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{Key, PageDriver};
use crate::models::selectors::Selector;
use crate::services::frame_locator::FrameLocator;

/// 设备搜索服务
#[derive(Debug, Clone)]
pub struct AssetSearch {
    locator: FrameLocator,
    search_input: Selector,
    input_timeout: Duration,
    network_idle_timeout: Duration,
    settle: Duration,
}

impl AssetSearch {
    pub fn new(
        locator: FrameLocator,
        search_input: Selector,
        input_timeout: Duration,
        network_idle_timeout: Duration,
        settle: Duration,
    ) -> Self {
        Self {
            locator,
            search_input,
            input_timeout,
            network_idle_timeout,
            settle,
        }
    }

    /// 搜索设备
    ///
    /// 搜索框未出现返回 `ElementNotFound`；网络空闲等待超时只记录日志。
    pub async fn search(&self, driver: &dyn PageDriver, tag: &str) -> AppResult<()> {
        info!("🔍 搜索设备: {}", tag);

        let input = self
            .locator
            .locate(driver, &self.search_input, self.input_timeout)
            .await?
            .ok_or_else(|| AppError::not_found(&self.search_input, "侧边栏搜索框"))?;

        driver.fill(&input, "").await?;
        driver.fill(&input, tag).await?;
        driver.press(&input, Key::Enter).await?;

        if !driver.wait_for_network_idle(self.network_idle_timeout).await {
            warn!("⚠️ 等待网络空闲超时 ({:?})，继续执行", self.network_idle_timeout);
        }

        // 设备窗口渲染没有完成事件
        sleep(self.settle).await;
        debug!("搜索完成: {}", tag);
        Ok(())
    }
}
