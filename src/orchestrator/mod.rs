//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批次处理和资源调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 应用生命周期
//! - 管理浏览器会话（获取一次、释放一次）
//! - 加载工单、登录、处理中断
//! - 输出最终报告
//!
//! ### `order_processor` - 工单批次处理器
//! - 按表格顺序遍历工单（`&[WorkOrder]`）
//! - 前置清理、重复检查、委托 OrderFlow
//! - 在工单边界拦截错误：计数、截图、紧急清理
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (会话 + 登录)
//!     ↓
//! order_processor (处理 Vec<WorkOrder>)
//!     ↓
//! workflow::OrderFlow (处理单张 WorkOrder)
//!     ↓
//! services (能力层：定位 / 窗口清理 / 重复检查 / 下拉框 / 截图)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管会话，order_processor 管工单
//! 2. **资源隔离**：只有编排层持有浏览器会话
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure

pub mod batch_processor;
pub mod order_processor;

// 重新导出主要类型
pub use batch_processor::{App, RunOutcome};
pub use order_processor::{BatchOutcome, BatchRunner, CleanupStrategy};
