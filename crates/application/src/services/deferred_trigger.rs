use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use scheduler_errors::{SchedulerError, SchedulerResult};

use crate::ports::JobTrigger;

/// 延迟执行的作业触发器
///
/// 只负责把作业键放入队列并立即返回，由 [`run_deferred_trigger_loop`]
/// 在后台调用真正的触发器。动作链因此不会阻塞状态更新。
#[derive(Clone)]
pub struct DeferredJobTrigger {
    sender: mpsc::UnboundedSender<String>,
}

impl DeferredJobTrigger {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl JobTrigger for DeferredJobTrigger {
    async fn execute_job(&self, job_key: &str) -> SchedulerResult<()> {
        self.sender
            .send(job_key.to_string())
            .map_err(|_| SchedulerError::internal("延迟触发队列已关闭"))?;
        debug!("作业 {} 已加入延迟触发队列", job_key);
        Ok(())
    }
}

/// 消费延迟触发队列，每个作业键在独立的 tokio 任务中执行
pub async fn run_deferred_trigger_loop(
    mut receiver: mpsc::UnboundedReceiver<String>,
    trigger: Arc<dyn JobTrigger>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    info!("延迟触发循环已启动");
    loop {
        tokio::select! {
            next = receiver.recv() => {
                let Some(job_key) = next else {
                    debug!("延迟触发队列已关闭");
                    break;
                };
                let trigger = Arc::clone(&trigger);
                tokio::spawn(async move {
                    if let Err(e) = trigger.execute_job(&job_key).await {
                        warn!(
                            event = "chained_job_failed",
                            job.key = %job_key,
                            error = %e,
                            "链式触发作业 {} 失败: {}",
                            job_key,
                            e
                        );
                    }
                });
            }
            _ = shutdown_rx.recv() => {
                info!("收到关闭信号，停止延迟触发循环");
                break;
            }
        }
    }
}
