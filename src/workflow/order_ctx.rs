//! 工单处理上下文
//!
//! 封装"我正在处理批次中的第几张工单"这一信息

use std::fmt::Display;

/// 工单处理上下文
#[derive(Debug, Clone)]
pub struct OrderCtx {
    /// 工单在批次中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 批次总数
    pub total: usize,

    /// 设备 TAG
    pub tag: String,
}

impl OrderCtx {
    pub fn new(index: usize, total: usize, tag: impl Into<String>) -> Self {
        Self {
            index,
            total,
            tag: tag.into(),
        }
    }
}

impl Display for OrderCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[工单 {}/{} TAG#{}]", self.index, self.total, self.tag)
    }
}
