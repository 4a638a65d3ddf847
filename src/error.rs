use std::time::Duration;

use thiserror::Error;

use crate::models::selectors::Selector;

/// 应用程序错误类型
///
/// 单个工单内的错误（元素不存在、表单超时、控件禁用……）只影响当前工单，
/// 由编排层在工单边界捕获；`Session` 类错误会中止整个批次。
#[derive(Debug, Error)]
pub enum AppError {
    /// 在所有 frame 中都找不到必需的控件
    #[error("找不到元素 {selector} ({context})")]
    ElementNotFound {
        selector: Selector,
        context: &'static str,
    },

    /// 工单表单没有在时限内出现或消失
    #[error("表单超时: {stage} 超过 {timeout:?}")]
    FormTimeout {
        stage: &'static str,
        timeout: Duration,
    },

    /// 控件存在但处于禁用状态
    #[error("控件已禁用: {control}")]
    DisabledControl { control: &'static str },

    /// 元素存在但不可交互（不可见）
    #[error("元素不可交互: {selector}")]
    NotInteractable { selector: Selector },

    /// 所有窗口清理手段都未能恢复单窗口状态
    #[error("窗口清理失败: 仍有 {remaining} 个窗口")]
    CleanupFailure { remaining: usize },

    /// 浏览器会话本身丢失，整个批次无法继续
    #[error("浏览器会话错误: {0}")]
    Session(String),

    /// 浏览器引擎返回的普通错误
    #[error("浏览器操作失败: {0}")]
    Driver(String),

    /// 页面脚本返回了无法解析的结果
    #[error("脚本结果解析失败: {0}")]
    Script(#[from] serde_json::Error),

    /// 文件读写错误（截图等）
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl AppError {
    /// 是否为会话级错误（需要中止整个批次）
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, AppError::Session(_))
    }

    /// 创建元素未找到错误
    pub fn not_found(selector: &Selector, context: &'static str) -> Self {
        AppError::ElementNotFound {
            selector: selector.clone(),
            context,
        }
    }
}

// ========== 从浏览器引擎错误转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        use chromiumoxide::error::CdpError;

        // websocket 断开或通道关闭意味着浏览器已经不在了
        match err {
            CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
                AppError::Session(err.to_string())
            }
            other => AppError::Driver(other.to_string()),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_session_errors_abort_the_batch() {
        assert!(AppError::Session("closed".into()).is_session_fatal());
        assert!(!AppError::DisabledControl { control: "保存" }.is_session_fatal());
        assert!(!AppError::CleanupFailure { remaining: 3 }.is_session_fatal());
        assert!(!AppError::FormTimeout {
            stage: "FormOpening",
            timeout: Duration::from_secs(10),
        }
        .is_session_fatal());
    }

    #[test]
    fn not_found_message_names_the_selector() {
        let err = AppError::not_found(&Selector::css("#btnAbrirOS_text"), "打开工单");
        let msg = err.to_string();
        assert!(msg.contains("#btnAbrirOS_text"));
        assert!(msg.contains("打开工单"));
    }
}
