//! 浏览器会话
//!
//! 整个批次只获取一次浏览器，结束（完成、出错、Ctrl+C）时释放一次。
//! 自行启动的浏览器在释放时关闭；通过调试端口连接的浏览器只断开连接。

mod connection;
mod launch;

use anyhow::Result;
use chromiumoxide::{Browser, Handler, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;

pub use connection::connect_to_browser;
pub use launch::launch_browser;

/// 在后台处理浏览器事件
fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    })
}

/// 浏览器会话
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    /// 是否由本程序启动
    launched: bool,
}

impl BrowserSession {
    /// 按配置连接或启动浏览器
    pub async fn open(config: &Config) -> Result<Self> {
        let (browser, page, handler, launched) = match config.browser_debug_port {
            Some(port) => {
                let (browser, page, handler) = connect_to_browser(port).await?;
                (browser, page, handler, false)
            }
            None => {
                let (browser, page, handler) =
                    launch_browser(config.headless, config.chrome_executable.as_deref()).await?;
                (browser, page, handler, true)
            }
        };

        Ok(Self {
            browser,
            page,
            handler,
            launched,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 释放会话，错误只记录日志
    pub async fn close(mut self) {
        info!("🔌 正在关闭浏览器...");

        if let Err(e) = self.page.clone().close().await {
            debug!("关闭页面失败: {}", e);
        }

        if self.launched {
            if let Err(e) = self.browser.close().await {
                warn!("⚠️ 关闭浏览器失败: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                debug!("等待浏览器进程退出失败: {}", e);
            }
        } else {
            debug!("浏览器由外部启动，仅断开连接");
        }

        self.handler.abort();
        info!("✅ 浏览器已释放");
    }
}
