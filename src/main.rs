use std::process::ExitCode;

use neovero_os_automation::utils::logging;
use neovero_os_automation::{App, Config, RunOutcome};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    let _guard = match logging::init(&config.logs_dir(), config.verbose_logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("日志初始化失败: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // 初始化并运行应用
    let result = match App::initialize(config) {
        Ok(app) => app.run().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(RunOutcome::Completed) => ExitCode::SUCCESS,
        Ok(RunOutcome::Interrupted) => {
            info!("已中断，浏览器已释放");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("❌ 程序异常退出: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
