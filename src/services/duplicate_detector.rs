//! 停用工单重复检查 - 业务能力层
//!
//! 只负责"历史里是否已有停用工单"这一判断，不关心流程

use std::str::FromStr;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::infrastructure::PageDriver;
use crate::models::mentions_deactivation;
use crate::models::selectors::{Selector, Selectors};

/// 表示该行工单已结束的状态词
const FINISHED_STATUSES: [&str; 7] = [
    "ENCERRADA",
    "CANCELADA",
    "FECHADA",
    "CONCLUÍDA",
    "CLOSED",
    "CANCELLED",
    "COMPLETED",
];

/// 重复判定规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// 任何提到停用的历史行都算重复，不看状态（默认，最保守）
    AnyMention,
    /// 已结束（关闭/取消/完成）的停用行不算重复
    ActiveOnly,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" | "any-mention" => Ok(DuplicatePolicy::AnyMention),
            "active-only" | "active" => Ok(DuplicatePolicy::ActiveOnly),
            other => Err(format!("未知的重复判定规则: {}", other)),
        }
    }
}

/// 单行文本是否构成重复
pub fn row_indicates_deactivation(text: &str, policy: DuplicatePolicy) -> bool {
    if !mentions_deactivation(text) {
        return false;
    }
    match policy {
        DuplicatePolicy::AnyMention => true,
        DuplicatePolicy::ActiveOnly => {
            let upper = text.to_uppercase();
            !FINISHED_STATUSES.iter().any(|s| upper.contains(s))
        }
    }
}

/// 停用重复检查
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    policy: DuplicatePolicy,
    row_selectors: Vec<Selector>,
    settle: Duration,
}

impl DuplicateDetector {
    pub fn new(selectors: &Selectors, policy: DuplicatePolicy, settle: Duration) -> Self {
        Self {
            policy,
            row_selectors: selectors.history_rows.clone(),
            settle,
        }
    }

    /// 扫描所有 frame 的可见表格行，第一条命中即返回 true
    pub async fn has_existing_deactivation(&self, driver: &dyn PageDriver) -> AppResult<bool> {
        info!("🔎 正在检查历史工单...");
        // 历史表异步渲染，没有完成事件
        sleep(self.settle).await;

        for frame in driver.frames().await? {
            for selector in &self.row_selectors {
                let rows = match driver.visible_texts(&frame, selector).await {
                    Ok(rows) => rows,
                    Err(e) if e.is_session_fatal() => return Err(e),
                    Err(e) => {
                        debug!("读取 {} 中的 {} 失败: {}", frame, selector, e);
                        continue;
                    }
                };

                if let Some(row) = rows
                    .iter()
                    .find(|row| row_indicates_deactivation(row, self.policy))
                {
                    warn!("⚠️ 已存在停用工单: '{}'", row.trim());
                    return Ok(true);
                }
            }
        }

        debug!("未发现停用工单");
        Ok(false)
    }
}
