use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, info, warn};

use scheduler_domain::events::JobFireEvent;
use scheduler_domain::ports::TriggerRegistry;
use scheduler_errors::{SchedulerError, SchedulerResult};

use super::cron_utils::CronScheduler;

#[derive(Debug, Clone)]
struct TriggerEntry {
    scheduler: CronScheduler,
    paused: bool,
    next_fire: Option<DateTime<Utc>>,
}

impl TriggerEntry {
    fn new(scheduler: CronScheduler, paused: bool, now: DateTime<Utc>) -> Self {
        let next_fire = if paused {
            None
        } else {
            scheduler.next_execution_time(now)
        };
        Self {
            scheduler,
            paused,
            next_fire,
        }
    }
}

/// 进程内 CRON 触发器注册表
///
/// 按固定间隔检查到期的触发器，并把 [`JobFireEvent`] 发送到事件队列。
/// 错过的多次触发只补发一次，之后从当前时间重新计算下一次执行时间。
#[derive(Clone)]
pub struct CronTriggerRegistry {
    triggers: Arc<RwLock<HashMap<String, TriggerEntry>>>,
    sender: mpsc::UnboundedSender<JobFireEvent>,
    tick_interval: Duration,
}

impl CronTriggerRegistry {
    pub fn new(tick_interval: Duration) -> (Self, mpsc::UnboundedReceiver<JobFireEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let registry = Self {
            triggers: Arc::new(RwLock::new(HashMap::new())),
            sender,
            tick_interval,
        };
        (registry, receiver)
    }

    fn send(&self, event: JobFireEvent) -> SchedulerResult<()> {
        let job_key = event.job_key.clone();
        self.sender
            .send(event)
            .map_err(|_| SchedulerError::internal(format!("触发事件队列已关闭，无法触发作业 {job_key}")))
    }

    /// 发送所有在 `now` 之前到期的触发事件，返回触发数量
    pub async fn fire_due(&self, now: DateTime<Utc>) -> usize {
        let mut due = Vec::new();
        {
            let mut triggers = self.triggers.write().await;
            for (job_key, entry) in triggers.iter_mut() {
                if entry.paused {
                    continue;
                }
                if let Some(next_fire) = entry.next_fire {
                    if next_fire <= now {
                        due.push((job_key.clone(), entry.scheduler.expression().to_string()));
                        entry.next_fire = entry.scheduler.next_execution_time(now);
                    }
                }
            }
        }

        let mut fired = 0;
        for (job_key, expression) in due {
            debug!("CRON 触发作业: {} ({})", job_key, expression);
            match self.send(JobFireEvent::scheduled(&job_key)) {
                Ok(()) => fired += 1,
                Err(e) => warn!("发送触发事件失败: {}", e),
            }
        }
        fired
    }

    /// 触发器主循环，收到关闭信号后退出
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("CRON 触发器已启动，检查间隔 {:?}", self.tick_interval);
        let mut interval = tokio::time::interval(self.tick_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.fire_due(Utc::now()).await;
                }
                _ = shutdown_rx.recv() => {
                    info!("收到关闭信号，停止 CRON 触发器");
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl TriggerRegistry for CronTriggerRegistry {
    fn validate_expression(&self, cron_expression: &str) -> SchedulerResult<()> {
        CronScheduler::validate_cron_expression(cron_expression)
    }

    async fn register(
        &self,
        job_key: &str,
        cron_expression: &str,
        paused: bool,
    ) -> SchedulerResult<()> {
        let scheduler = CronScheduler::new(cron_expression)?;
        let entry = TriggerEntry::new(scheduler, paused, Utc::now());
        self.triggers
            .write()
            .await
            .insert(job_key.to_string(), entry);
        Ok(())
    }

    async fn unregister(&self, job_key: &str) -> SchedulerResult<bool> {
        Ok(self.triggers.write().await.remove(job_key).is_some())
    }

    async fn pause(&self, job_key: &str) -> SchedulerResult<bool> {
        let mut triggers = self.triggers.write().await;
        match triggers.get_mut(job_key) {
            Some(entry) => {
                entry.paused = true;
                entry.next_fire = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn resume(&self, job_key: &str) -> SchedulerResult<bool> {
        let mut triggers = self.triggers.write().await;
        match triggers.get_mut(job_key) {
            Some(entry) => {
                entry.paused = false;
                entry.next_fire = entry.scheduler.next_execution_time(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn fire_now(&self, job_key: &str) -> SchedulerResult<()> {
        debug!("手动触发作业: {}", job_key);
        self.send(JobFireEvent::manual(job_key))
    }

    async fn is_scheduled(&self, job_key: &str) -> bool {
        self.triggers.read().await.contains_key(job_key)
    }

    async fn is_paused(&self, job_key: &str) -> bool {
        self.triggers
            .read()
            .await
            .get(job_key)
            .map(|entry| entry.paused)
            .unwrap_or(false)
    }

    async fn next_fire_time(&self, job_key: &str) -> Option<DateTime<Utc>> {
        self.triggers
            .read()
            .await
            .get(job_key)
            .and_then(|entry| entry.next_fire)
    }

    async fn scheduled_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.triggers.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}
