use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use scheduler_config::{AppConfig, ConfigValidator, LogFormat};
use scheduler_observability::init_logging;
use tokio::signal;
use tracing::{error, info, warn};

mod app;
mod shutdown;

use app::Application;
use shutdown::ShutdownManager;

/// 作业调度系统
#[derive(Debug, Parser)]
#[command(name = "job-scheduler", version, about = "作业调度系统")]
struct Cli {
    /// 配置文件路径，缺省时查找 config/scheduler.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long, value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: Option<String>,

    /// 日志格式
    #[arg(long, value_name = "FORMAT", value_parser = ["json", "pretty"])]
    log_format: Option<String>,

    /// 覆盖配置中的数据库连接地址
    #[arg(long, value_name = "URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_logging(&config.observability)?;

    info!("启动作业调度系统");
    if let Some(path) = &cli.config {
        info!("配置文件: {path}");
    }

    let app = Application::new(config).await?;

    let shutdown_manager = ShutdownManager::new();
    let mut app_handle = tokio::spawn(app.run(shutdown_manager.clone()));

    let outcome = tokio::select! {
        joined = &mut app_handle => {
            // 应用提前退出，不再等待信号
            shutdown_manager.shutdown().await;
            match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(anyhow::anyhow!("应用任务异常结束: {e}")),
            }
        }
        _ = wait_for_shutdown_signal() => {
            info!("收到关闭信号，开始优雅关闭...");
            shutdown_manager.shutdown().await;
            match tokio::time::timeout(Duration::from_secs(30), app_handle).await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => Err(anyhow::anyhow!("应用任务异常结束: {e}")),
                Err(_) => {
                    warn!("应用关闭超时，强制退出");
                    Ok(())
                }
            }
        }
    };

    match &outcome {
        Ok(()) => info!("作业调度系统已退出"),
        Err(e) => error!("应用运行失败: {e:#}"),
    }
    outcome
}

/// 加载配置并应用命令行覆盖
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("加载配置失败")?;

    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    if let Some(format) = cli.log_format.as_deref() {
        config.observability.log_format = match format {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
    }
    if let Some(url) = &cli.database_url {
        config.database.url = url.clone();
    }

    config.validate().context("命令行覆盖后的配置无效")?;
    Ok(config)
}

/// 等待 Ctrl+C 或 SIGTERM
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("安装Ctrl+C信号处理器失败: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("安装SIGTERM信号处理器失败: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}
