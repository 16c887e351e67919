use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use scheduler_domain::events::JobFireEvent;

use crate::services::job_service::JobService;

/// 消费触发器发出的事件，为每次触发创建任务
///
/// 每个事件在独立的 tokio 任务中处理，互不阻塞。
pub async fn run_fire_loop(
    mut events: mpsc::UnboundedReceiver<JobFireEvent>,
    job_service: Arc<JobService>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    info!("作业触发循环已启动");
    loop {
        tokio::select! {
            next = events.recv() => {
                let Some(event) = next else {
                    debug!("触发事件通道已关闭");
                    break;
                };
                let job_service = Arc::clone(&job_service);
                tokio::spawn(async move {
                    // 失败已在 launch_job 中记录
                    let _ = job_service.launch_job(&event.job_key, event.source).await;
                });
            }
            _ = shutdown_rx.recv() => {
                info!("收到关闭信号，停止作业触发循环");
                break;
            }
        }
    }
}
