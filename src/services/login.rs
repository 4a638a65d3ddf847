//! 登录服务 - 业务能力层

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::PageDriver;
use crate::models::selectors::Selectors;
use crate::services::frame_locator::FrameLocator;

/// 登录凭据
#[derive(Clone)]
pub struct Credentials {
    pub url: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// 登录服务
#[derive(Debug, Clone)]
pub struct LoginService {
    locator: FrameLocator,
    selectors: Selectors,
    element_timeout: Duration,
    navigation_timeout: Duration,
    settle: Duration,
}

impl LoginService {
    pub fn new(
        locator: FrameLocator,
        selectors: &Selectors,
        element_timeout: Duration,
        navigation_timeout: Duration,
        settle: Duration,
    ) -> Self {
        Self {
            locator,
            selectors: selectors.clone(),
            element_timeout,
            navigation_timeout,
            settle,
        }
    }

    /// 打开登录页并提交凭据
    ///
    /// 提交后没有发生导航只记录警告，由后续搜索步骤暴露真正的登录失败。
    pub async fn login(&self, driver: &dyn PageDriver, credentials: &Credentials) -> AppResult<()> {
        info!("🌐 正在打开: {}", credentials.url);
        driver.goto(&credentials.url).await?;

        let user = self
            .locator
            .locate(driver, &self.selectors.login_user, self.element_timeout)
            .await?
            .ok_or_else(|| AppError::not_found(&self.selectors.login_user, "登录用户名"))?;
        driver.fill(&user, &credentials.user).await?;

        let password = self
            .locator
            .locate(driver, &self.selectors.login_password, self.element_timeout)
            .await?
            .ok_or_else(|| AppError::not_found(&self.selectors.login_password, "登录密码"))?;
        driver.fill(&password, &credentials.password).await?;

        let submit = self
            .locator
            .locate(driver, &self.selectors.login_submit, self.element_timeout)
            .await?
            .ok_or_else(|| AppError::not_found(&self.selectors.login_submit, "登录按钮"))?;
        driver.click(&submit, false).await?;

        if driver.wait_for_navigation(self.navigation_timeout).await {
            info!("✓ 登录成功");
        } else {
            warn!("⚠️ 登录后未检测到页面跳转，继续执行");
        }

        // 菜单框架在导航完成后才异步渲染
        sleep(self.settle).await;
        Ok(())
    }
}
