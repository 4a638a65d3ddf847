//! 页面驱动能力 - 基础设施层
//!
//! 对浏览器自动化引擎的抽象：查询、点击、填写、按键、截图……
//! 元素不缓存句柄，每次调用都按 (frame, selector, index) 重新解析，
//! 因为目标系统的 iframe 在窗口关闭后立即失效。

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::AppResult;
use crate::models::selectors::Selector;

/// frame 引用：从顶层窗口逐级进入子 frame 的下标路径，空路径为主文档
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FrameRef {
    path: Vec<usize>,
}

impl FrameRef {
    /// 主文档
    pub fn main() -> Self {
        Self { path: Vec::new() }
    }

    pub fn child(path: Vec<usize>) -> Self {
        Self { path }
    }

    pub fn is_main(&self) -> bool {
        self.path.is_empty()
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }
}

impl fmt::Display for FrameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_main() {
            return write!(f, "main");
        }
        let path: Vec<String> = self.path.iter().map(|i| i.to_string()).collect();
        write!(f, "frame[{}]", path.join("/"))
    }
}

/// 元素引用：某个 frame 中某个选择器的第 index 个匹配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    pub frame: FrameRef,
    pub selector: Selector,
    pub index: usize,
}

impl ElementRef {
    pub fn new(frame: FrameRef, selector: Selector, index: usize) -> Self {
        Self {
            frame,
            selector,
            index,
        }
    }

    /// 同一 frame 中的第一个匹配
    pub fn first(frame: FrameRef, selector: Selector) -> Self {
        Self::new(frame, selector, 0)
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {} #{}", self.selector, self.frame, self.index)
    }
}

/// 支持的按键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    Enter,
}

/// 浏览器页面驱动
///
/// 同一页面上的操作严格串行，调用方不会并发发出两个交互命令。
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 导航到 URL
    async fn goto(&self, url: &str) -> AppResult<()>;

    /// 重新加载当前页面
    async fn reload(&self) -> AppResult<()>;

    /// 注册在每个新文档加载前执行的脚本
    async fn add_init_script(&self, script: &str) -> AppResult<()>;

    /// 当前挂载的所有 frame，主文档在前，子 frame 按文档顺序
    async fn frames(&self) -> AppResult<Vec<FrameRef>>;

    /// 匹配数量
    async fn count(&self, frame: &FrameRef, selector: &Selector) -> AppResult<usize>;

    async fn is_visible(&self, element: &ElementRef) -> AppResult<bool>;

    async fn is_enabled(&self, element: &ElementRef) -> AppResult<bool>;

    async fn is_checked(&self, element: &ElementRef) -> AppResult<bool>;

    /// 点击；`force` 为 true 时跳过可见性检查
    async fn click(&self, element: &ElementRef, force: bool) -> AppResult<()>;

    /// 清空并填写
    async fn fill(&self, element: &ElementRef, value: &str) -> AppResult<()>;

    async fn press(&self, element: &ElementRef, key: Key) -> AppResult<()>;

    /// frame 中所有可见匹配的渲染文本
    async fn visible_texts(&self, frame: &FrameRef, selector: &Selector) -> AppResult<Vec<String>>;

    /// 下拉框所有选项的显示文本
    async fn option_labels(&self, element: &ElementRef) -> AppResult<Vec<String>>;

    /// 按显示文本选择下拉项，返回是否选中
    async fn select_option(&self, element: &ElementRef, label: &str) -> AppResult<bool>;

    /// 删除主文档中除第一个以外的所有匹配元素，返回删除数量
    async fn remove_all_but_first(&self, selector: &Selector) -> AppResult<usize>;

    /// 在视口坐标处点击
    async fn click_at(&self, x: f64, y: f64) -> AppResult<()>;

    /// 等待网络空闲，超时返回 false
    async fn wait_for_network_idle(&self, timeout: Duration) -> bool;

    /// 等待一次导航完成，超时返回 false
    async fn wait_for_navigation(&self, timeout: Duration) -> bool;

    /// 截图保存为 PNG
    async fn screenshot(&self, path: &Path) -> AppResult<()>;

    /// 在页面上下文执行任意脚本
    async fn evaluate(&self, script: &str) -> AppResult<JsonValue>;
}
