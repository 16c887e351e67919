use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use scheduler_api::{create_app, AppState};
use scheduler_application::{
    run_deferred_trigger_loop, run_fire_loop, ActionRunner, DeferredJobTrigger, JobTrigger,
    RunJobActionRunner, SchedulerContext,
};
use scheduler_config::AppConfig;
use scheduler_domain::events::JobFireEvent;
use scheduler_domain::ports::TriggerRegistry;
use scheduler_infrastructure::{CronTriggerRegistry, DatabaseManager, RepositoryFactory};
use scheduler_observability::init_metrics;
use tokio::{net::TcpListener, sync::mpsc, task::JoinHandle};
use tracing::{error, info, warn};

use crate::shutdown::ShutdownManager;

/// 主应用程序
pub struct Application {
    config: AppConfig,
    context: SchedulerContext,
    registry: CronTriggerRegistry,
    fire_rx: mpsc::UnboundedReceiver<JobFireEvent>,
    deferred_rx: mpsc::UnboundedReceiver<String>,
    database: Option<DatabaseManager>,
    metrics: Option<metrics_exporter_prometheus::PrometheusHandle>,
}

impl Application {
    /// 按 存储 -> 触发器 -> 服务 -> 对账 的顺序组装应用
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("初始化应用程序，存储后端: {:?}", config.database.backend);

        let metrics = if config.observability.metrics_enabled {
            Some(init_metrics().context("初始化指标导出失败")?)
        } else {
            None
        };

        let repositories = RepositoryFactory::create(&config.database)
            .await
            .context("创建存储失败")?;

        let (registry, fire_rx) =
            CronTriggerRegistry::new(Duration::from_millis(config.scheduler.tick_interval_ms));

        // 动作链通过延迟队列回到作业服务
        let (deferred, deferred_rx) = DeferredJobTrigger::channel();
        let runners: Vec<Arc<dyn ActionRunner>> =
            vec![Arc::new(RunJobActionRunner::new(Arc::new(deferred)))];

        let context = SchedulerContext::build(
            repositories.job_repository,
            repositories.task_repository,
            Arc::new(registry.clone()),
            runners,
        )
        .context("组装调度服务失败")?;

        let report = context
            .scheduler
            .reconcile()
            .await
            .context("启动对账失败")?;
        if !report.failed.is_empty() {
            warn!("以下作业未能重新注册: {:?}", report.failed);
        }
        let scheduled = registry.scheduled_keys().await;
        info!("已注册 {} 个触发器: {:?}", scheduled.len(), scheduled);

        Ok(Self {
            config,
            context,
            registry,
            fire_rx,
            deferred_rx,
            database: repositories.database,
            metrics,
        })
    }

    /// 启动后台循环与 HTTP 服务，直到收到关闭信号
    pub async fn run(self, shutdown: ShutdownManager) -> Result<()> {
        let Self {
            config,
            context,
            registry,
            fire_rx,
            deferred_rx,
            database,
            metrics,
        } = self;

        let mut handles: Vec<JoinHandle<()>> = Vec::new();

        {
            let shutdown_rx = shutdown.subscribe().await;
            handles.push(tokio::spawn(async move {
                registry.run(shutdown_rx).await;
            }));
        }

        handles.push(tokio::spawn(run_fire_loop(
            fire_rx,
            context.job_service.clone(),
            shutdown.subscribe().await,
        )));

        let trigger: Arc<dyn JobTrigger> = context.job_service.clone();
        handles.push(tokio::spawn(run_deferred_trigger_loop(
            deferred_rx,
            trigger,
            shutdown.subscribe().await,
        )));

        let served = if config.api.enabled {
            let state = AppState {
                job_service: context.job_service.clone(),
                metrics,
            };
            serve_api(create_app(state, &config.api), &config.api.bind_address, &shutdown).await
        } else {
            info!("API服务器已禁用");
            let mut shutdown_rx = shutdown.subscribe().await;
            let _ = shutdown_rx.recv().await;
            Ok(())
        };

        // 服务器异常退出时后台循环也必须停止
        if served.is_err() {
            shutdown.shutdown().await;
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("后台任务异常退出: {}", e);
            }
        }

        if let Some(database) = database {
            database.close().await;
        }

        info!("所有组件已停止");
        served
    }
}

async fn serve_api(app: Router, bind_address: &str, shutdown: &ShutdownManager) -> Result<()> {
    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("绑定地址失败: {bind_address}"))?;
    info!("API服务器启动在 http://{}", bind_address);

    let mut shutdown_rx = shutdown.subscribe().await;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("API服务器停止接收新请求");
        })
        .await
        .context("API服务器运行失败")
}
