//! 诊断截图服务 - 业务能力层
//!
//! 只负责"把当前页面截图写到日志目录"能力，失败不影响流程

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::infrastructure::PageDriver;

/// 截图阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// 单个工单失败
    Order,
    /// 表单填写失败
    Filling,
    /// 会话级失败
    Fatal,
}

/// 诊断截图服务
#[derive(Debug, Clone)]
pub struct Diagnostics {
    dir: PathBuf,
}

impl Diagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 截图文件路径
    pub fn path_for(&self, stage: FailureStage, tag: &str) -> PathBuf {
        let name = match stage {
            FailureStage::Order => format!("erro_{}.png", file_safe(tag)),
            FailureStage::Filling => format!("erro_preenchimento_{}.png", file_safe(tag)),
            FailureStage::Fatal => "fatal_error.png".to_string(),
        };
        self.dir.join(name)
    }

    /// 截图，失败只记录日志
    pub async fn capture(&self, driver: &dyn PageDriver, stage: FailureStage, tag: &str) -> Option<PathBuf> {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!("⚠️ 无法创建截图目录 {}: {}", self.dir.display(), e);
            return None;
        }

        let path = self.path_for(stage, tag);
        match driver.screenshot(&path).await {
            Ok(()) => {
                info!("📸 截图已保存: {}", path.display());
                Some(path)
            }
            Err(e) => {
                debug!("截图失败 {}: {}", path.display(), e);
                warn!("⚠️ 截图失败: {}", e);
                None
            }
        }
    }
}

/// 文件名中不允许的字符替换为 '_'
fn file_safe(tag: &str) -> String {
    tag.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
