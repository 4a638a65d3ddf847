use anyhow::{Context, Result};
use chromiumoxide::{Browser, Page};
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::spawn_handler;

/// 连接到已打开的浏览器（调试端口）并新建一个空白页面
pub async fn connect_to_browser(port: u16) -> Result<(Browser, Page, tokio::task::JoinHandle<()>)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("🔗 正在连接到浏览器: {}", browser_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

    let handle = spawn_handler(handler);

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("浏览器中已有 {} 个页面", pages.len());

    let page = browser
        .new_page("about:blank")
        .await
        .context("创建空白页面失败")?;

    Ok((browser, page, handle))
}
