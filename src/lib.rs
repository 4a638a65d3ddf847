//! # Neovero OS Automation
//!
//! 把表格中的工单（Ordem de Serviço）自动录入 Neovero 维护系统
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 页面能力抽象（查询、点击、填写、截图……）
//! - `ChromiumDriver` / `JsExecutor` - 唯一的 page owner，跨 frame 操作都经由页面脚本
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个动作
//! - `FrameLocator` - 跨 frame 定位
//! - `WindowReconciler` - 恢复"只剩主窗口"状态，唯一允许强制清理的地方
//! - `DuplicateDetector` - 停用工单重复检查
//! - `DropdownFiller` - 下拉框模糊匹配
//! - `AssetSearch` / `LoginService` / `Diagnostics`
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一张工单"的完整提交流程
//! - `OrderCtx` - 上下文封装（序号 + TAG）
//! - `OrderFlow` - 流程编排（open → fill → save → close → stabilize → sanitize）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 应用生命周期，管理浏览器会话
//! - `orchestrator/order_processor` - 工单批次处理器，逐张处理并拦截错误
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::BrowserSession;
pub use config::{Config, Timings};
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromiumDriver, ElementRef, FrameRef, JsExecutor, Key, PageDriver};
pub use models::{Selector, Selectors, WorkOrder, WorkOrderDraft};
pub use orchestrator::{App, BatchOutcome, BatchRunner, CleanupStrategy, RunOutcome};
pub use services::{DuplicatePolicy, ReconcileOutcome, WindowReconciler};
pub use workflow::{OrderCtx, OrderFlow};
