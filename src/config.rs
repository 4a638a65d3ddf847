use std::path::PathBuf;
use std::time::Duration;

use crate::orchestrator::CleanupStrategy;
use crate::services::DuplicatePolicy;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// Neovero 登录地址
    pub neovero_url: String,
    pub neovero_user: String,
    pub neovero_pass: String,
    /// 是否以无头模式启动浏览器
    pub headless: bool,
    /// 连接已打开的浏览器（调试端口），为空时自行启动
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件路径，为空时自动查找
    pub chrome_executable: Option<PathBuf>,
    /// 数据根目录（input / logs）
    pub data_dir: PathBuf,
    /// 输入表格文件名（位于 input 目录）
    pub input_file: String,
    /// 选择器覆盖文件（TOML）
    pub selectors_file: Option<PathBuf>,
    /// 工单之间的窗口清理方式
    pub cleanup_strategy: CleanupStrategy,
    /// 停用重复检查规则
    pub duplicate_policy: DuplicatePolicy,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 等待与停顿时长
    pub timings: Timings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            neovero_url: String::new(),
            neovero_user: String::new(),
            neovero_pass: String::new(),
            headless: false,
            browser_debug_port: None,
            chrome_executable: None,
            data_dir: PathBuf::from("data"),
            input_file: "dados.xlsx".to_string(),
            selectors_file: None,
            cleanup_strategy: CleanupStrategy::Teardown,
            duplicate_policy: DuplicatePolicy::AnyMention,
            verbose_logging: false,
            timings: Timings::default(),
        }
    }
}

impl Config {
    /// 从环境变量（以及当前目录的 .env）加载
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let default = Self::default();
        Self {
            neovero_url: std::env::var("NEOVERO_URL").unwrap_or(default.neovero_url),
            neovero_user: std::env::var("NEOVERO_USER").unwrap_or(default.neovero_user),
            neovero_pass: std::env::var("NEOVERO_PASS").unwrap_or(default.neovero_pass),
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from),
            data_dir: std::env::var("DATA_DIR").map(PathBuf::from).unwrap_or(default.data_dir),
            input_file: std::env::var("INPUT_FILE").unwrap_or(default.input_file),
            selectors_file: std::env::var("SELECTORS_FILE").ok().map(PathBuf::from),
            cleanup_strategy: std::env::var("CLEANUP_STRATEGY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.cleanup_strategy),
            duplicate_policy: std::env::var("DUPLICATE_POLICY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.duplicate_policy),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            timings: default.timings,
        }
    }

    pub fn input_dir(&self) -> PathBuf {
        self.data_dir.join("input")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// 输入表格完整路径
    pub fn input_path(&self) -> PathBuf {
        self.input_dir().join(&self.input_file)
    }
}

/// 等待与停顿
///
/// 目标系统没有“操作完成”事件。能轮询信号的地方都用带上限的轮询，
/// 固定停顿只留给没有可观察信号的场景，每一项都注明原因。
#[derive(Clone, Debug)]
pub struct Timings {
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 普通控件查找上限
    pub element_timeout: Duration,
    /// 侧边栏搜索框出现上限
    pub search_input_timeout: Duration,
    /// 工单表单出现上限
    pub form_open_timeout: Duration,
    /// 搜索后等待网络空闲上限（超时可容忍）
    pub network_idle_timeout: Duration,
    /// 登录后等待导航上限（超时可容忍）
    pub login_navigation_timeout: Duration,
    /// 登录后停顿：菜单框架在导航完成后才异步渲染
    pub post_login_settle: Duration,
    /// 搜索后停顿：设备窗口渲染没有完成事件
    pub search_settle: Duration,
    /// 历史工单表异步渲染，没有完成事件
    pub history_settle: Duration,
    /// 点击“立即关闭”后系统自行填写关闭日期，没有事件
    pub close_now_settle: Duration,
    /// 保存后等待表单自行关闭的上限
    pub save_close_timeout: Duration,
    /// 每次点击关闭控件后确认关闭的上限
    pub close_confirm_timeout: Duration,
    /// 表单关闭后停顿：窗口关闭动画没有完成事件，动画期间点击会落在正在消失的窗口上
    pub stabilize: Duration,
    /// 清理后停顿，让窗口管理器完成销毁
    pub cleanup_settle: Duration,
    /// 工单之间的停顿：侧边栏搜索框在上一张工单的窗口销毁后才重新可用，没有可观察信号
    pub between_orders: Duration,
    /// 页面重载后等待网络空闲上限
    pub reload_idle_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            element_timeout: Duration::from_secs(5),
            search_input_timeout: Duration::from_secs(10),
            form_open_timeout: Duration::from_secs(10),
            network_idle_timeout: Duration::from_secs(5),
            login_navigation_timeout: Duration::from_secs(10),
            post_login_settle: Duration::from_secs(3),
            search_settle: Duration::from_secs(2),
            history_settle: Duration::from_secs(3),
            close_now_settle: Duration::from_secs(1),
            save_close_timeout: Duration::from_secs(5),
            close_confirm_timeout: Duration::from_secs(2),
            stabilize: Duration::from_secs(1),
            cleanup_settle: Duration::from_secs(1),
            between_orders: Duration::from_millis(500),
            reload_idle_timeout: Duration::from_secs(10),
        }
    }
}

impl Timings {
    /// 所有停顿为零、等待上限极短（用于测试与演练）
    pub fn immediate() -> Self {
        let short = Duration::from_millis(20);
        Self {
            poll_interval: Duration::from_millis(2),
            element_timeout: short,
            search_input_timeout: short,
            form_open_timeout: short,
            network_idle_timeout: short,
            login_navigation_timeout: short,
            post_login_settle: Duration::ZERO,
            search_settle: Duration::ZERO,
            history_settle: Duration::ZERO,
            close_now_settle: Duration::ZERO,
            save_close_timeout: short,
            close_confirm_timeout: short,
            stabilize: Duration::ZERO,
            cleanup_settle: Duration::ZERO,
            between_orders: Duration::ZERO,
            reload_idle_timeout: short,
        }
    }
}
