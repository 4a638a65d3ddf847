use std::path::Path;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::spawn_handler;

/// 启动新的浏览器进程并新建一个空白页面
pub async fn launch_browser(
    headless: bool,
    executable: Option<&Path>,
) -> Result<(Browser, Page, tokio::task::JoinHandle<()>)> {
    info!("🚀 启动浏览器 (无头模式: {})...", headless);

    let mut builder = BrowserConfig::builder()
        .window_size(1366, 768)
        .args(vec![
            "--no-sandbox",            // 禁用沙盒，防止权限问题导致的崩溃
            "--disable-dev-shm-usage", // 防止共享内存不足
        ]);
    builder = if headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = executable {
        debug!("浏览器路径: {}", path.display());
        builder = builder.chrome_executable(path);
    }

    let config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        anyhow::anyhow!("配置浏览器失败: {}", e)
    })?;

    let (browser, handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

    let handle = spawn_handler(handler);

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        anyhow::anyhow!("创建页面失败: {}", e)
    })?;

    Ok((browser, page, handle))
}
