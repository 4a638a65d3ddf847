//! 应用生命周期 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责资源管理和批次调度。
//!
//! ## 核心功能
//!
//! 1. **加载工单**：读取输入表格并校验
//! 2. **资源管理**：唯一持有浏览器会话；无论以何种方式结束都只释放一次
//! 3. **登录**：注入防抢焦点脚本后登录
//! 4. **批次处理**：委托 `BatchRunner`，支持 Ctrl+C 中断
//! 5. **最终报告**
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单张工单的细节
//! - **会话级错误**：截图 `fatal_error.png` 后向上传播

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::infrastructure::{ChromiumDriver, JsExecutor, PageDriver};
use crate::models::selectors::Selectors;
use crate::models::{load_work_orders, WorkOrder};
use crate::orchestrator::order_processor::BatchRunner;
use crate::services::{Credentials, Diagnostics, FailureStage, FrameLocator, LoginService};
use crate::utils::logging;

/// 阻止目标系统抢夺窗口焦点
const ANTI_FOCUS_SCRIPT: &str = "window.focus = function() { return false; }";

/// 运行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 所有工单都已处理（或没有工单）
    Completed,
    /// 被 Ctrl+C 中断
    Interrupted,
}

/// 应用主结构
pub struct App {
    config: Config,
    selectors: Selectors,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        let selectors = match &config.selectors_file {
            Some(path) => {
                info!("📄 加载选择器覆盖文件: {}", path.display());
                Selectors::load(path)?
            }
            None => Selectors::default(),
        };

        logging::log_startup(&config);
        Ok(Self { config, selectors })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunOutcome> {
        let orders = self.load_orders()?;
        if orders.is_empty() {
            warn!("⚠️ 没有可处理的工单，程序结束");
            return Ok(RunOutcome::Completed);
        }
        logging::log_orders_loaded(orders.len(), &self.config.input_path());

        let session = BrowserSession::open(&self.config)
            .await
            .context("无法获取浏览器")?;
        let driver = ChromiumDriver::new(JsExecutor::new(session.page().clone()));

        let result = tokio::select! {
            result = self.drive(&driver, &orders) => result.map(|_| RunOutcome::Completed),
            _ = tokio::signal::ctrl_c() => {
                warn!("🛑 收到中断信号，停止处理");
                Ok(RunOutcome::Interrupted)
            }
        };

        if let Err(e) = &result {
            Diagnostics::new(self.config.logs_dir())
                .capture(&driver, FailureStage::Fatal, "")
                .await;
        }

        session.close().await;
        result
    }

    fn load_orders(&self) -> Result<Vec<WorkOrder>> {
        let input = self.config.input_path();
        info!("\n📁 正在读取工单: {}", input.display());
        if !input.exists() {
            anyhow::bail!("找不到输入文件: {}", input.display());
        }
        load_work_orders(&input)
    }

    /// 登录并处理整个批次
    async fn drive(&self, driver: &dyn PageDriver, orders: &[WorkOrder]) -> Result<()> {
        driver
            .add_init_script(ANTI_FOCUS_SCRIPT)
            .await
            .context("注入防抢焦点脚本失败")?;
        info!("🔒 已注入防抢焦点脚本");

        let timings = &self.config.timings;
        let login = LoginService::new(
            FrameLocator::new(timings.poll_interval),
            &self.selectors,
            timings.element_timeout,
            timings.login_navigation_timeout,
            timings.post_login_settle,
        );
        let credentials = Credentials {
            url: self.config.neovero_url.clone(),
            user: self.config.neovero_user.clone(),
            password: self.config.neovero_pass.clone(),
        };
        info!("🔐 正在登录...");
        login.login(driver, &credentials).await.context("登录失败")?;

        let runner = BatchRunner::new(&self.config, &self.selectors);
        let outcome = runner.run(driver, orders).await.context("批次中止")?;

        logging::log_final_report(&outcome, orders.len(), &self.config.logs_dir());
        Ok(())
    }
}
