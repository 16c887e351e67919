use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use scheduler_domain::entities::Job;
use scheduler_domain::ports::TriggerRegistry;
use scheduler_domain::repositories::JobRepository;
use scheduler_errors::{SchedulerError, SchedulerResult};
use scheduler_observability::{MetricsCollector, StructuredLogger};

/// 作业在触发器中的状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleState {
    pub job_key: String,
    pub scheduled: bool,
    pub enabled: bool,
    pub next_fire_time: Option<DateTime<Utc>>,
}

/// 启动对账的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub registered: Vec<String>,
    pub failed: Vec<String>,
}

/// 将持久化的作业调度状态同步到触发器
///
/// 存储是唯一可信来源，触发器中的状态可以随时从存储重建。
/// 所有修改都先写存储，再更新触发器。
pub struct SchedulerService {
    job_repo: Arc<dyn JobRepository>,
    registry: Arc<dyn TriggerRegistry>,
}

impl SchedulerService {
    pub fn new(job_repo: Arc<dyn JobRepository>, registry: Arc<dyn TriggerRegistry>) -> Self {
        Self { job_repo, registry }
    }

    pub fn validate_cron(&self, cron_expression: &str) -> SchedulerResult<()> {
        self.registry.validate_expression(cron_expression)
    }

    /// 安装或替换作业的触发器，禁用的作业以暂停状态安装
    #[instrument(skip(self, job), fields(job.key = %job.key))]
    pub async fn register(&self, job: &Job) -> SchedulerResult<()> {
        let cron = job
            .cron_expression
            .as_deref()
            .ok_or_else(|| SchedulerError::not_a_scheduled_job(&job.key))?;

        self.registry.validate_expression(cron)?;
        self.registry.register(&job.key, cron, !job.enabled).await?;

        StructuredLogger::log_trigger_registered(&job.key, cron, !job.enabled);
        MetricsCollector::record_trigger_registered();
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn unregister(&self, job_key: &str) -> SchedulerResult<()> {
        if self.registry.unregister(job_key).await? {
            StructuredLogger::log_trigger_unregistered(job_key);
            return Ok(());
        }

        // 触发器中没有，但存储中仍有调度配置时视为已移除
        match self.job_repo.find_by_key(job_key).await? {
            Some(job) if job.is_scheduled() => {
                debug!("作业 {} 没有活动的触发器，无需移除", job_key);
                Ok(())
            }
            _ => Err(SchedulerError::job_not_found(job_key)),
        }
    }

    #[instrument(skip(self))]
    pub async fn enable(&self, job_key: &str) -> SchedulerResult<Job> {
        let mut job = self.load_scheduled_job(job_key).await?;
        if job.enabled {
            return Err(SchedulerError::job_already_enabled(job_key));
        }

        job.enabled = true;
        job.touch();
        let job = self.job_repo.update(&job).await?;

        if self.registry.is_scheduled(job_key).await {
            self.registry.resume(job_key).await?;
        } else {
            self.register(&job).await?;
        }

        info!("作业 {} 已启用", job_key);
        Ok(job)
    }

    #[instrument(skip(self))]
    pub async fn disable(&self, job_key: &str) -> SchedulerResult<Job> {
        let mut job = self.load_scheduled_job(job_key).await?;
        if !job.enabled {
            return Err(SchedulerError::job_already_disabled(job_key));
        }

        job.enabled = false;
        job.touch();
        let job = self.job_repo.update(&job).await?;

        if self.registry.is_scheduled(job_key).await {
            self.registry.pause(job_key).await?;
        }

        info!("作业 {} 已禁用", job_key);
        Ok(job)
    }

    /// 立即执行一次，不受启用状态和 CRON 配置影响
    pub async fn execute_job(&self, job_key: &str) -> SchedulerResult<()> {
        self.registry.fire_now(job_key).await
    }

    pub async fn is_scheduled(&self, job_key: &str) -> bool {
        self.registry.is_scheduled(job_key).await
    }

    pub async fn is_enabled(&self, job_key: &str) -> bool {
        self.registry.is_scheduled(job_key).await && !self.registry.is_paused(job_key).await
    }

    pub async fn is_disabled(&self, job_key: &str) -> bool {
        self.registry.is_scheduled(job_key).await && self.registry.is_paused(job_key).await
    }

    pub async fn schedule_state(&self, job_key: &str) -> ScheduleState {
        ScheduleState {
            job_key: job_key.to_string(),
            scheduled: self.is_scheduled(job_key).await,
            enabled: self.is_enabled(job_key).await,
            next_fire_time: self.registry.next_fire_time(job_key).await,
        }
    }

    /// 启动时重新注册所有已启用且配置了 CRON 的作业
    ///
    /// 单个作业注册失败只记录日志，不会中断对账。
    pub async fn reconcile(&self) -> SchedulerResult<ReconcileReport> {
        let jobs = self.job_repo.find_scheduled().await?;
        let mut report = ReconcileReport::default();

        for job in jobs {
            match self.register(&job).await {
                Ok(()) => report.registered.push(job.key),
                Err(e) => {
                    warn!("对账时注册作业 {} 失败: {}", job.key, e);
                    report.failed.push(job.key);
                }
            }
        }

        MetricsCollector::record_reconciliation_failures(report.failed.len() as u64);
        StructuredLogger::log_reconciliation_complete(report.registered.len(), report.failed.len());
        Ok(report)
    }

    async fn load_scheduled_job(&self, job_key: &str) -> SchedulerResult<Job> {
        let job = self
            .job_repo
            .find_by_key(job_key)
            .await?
            .ok_or_else(|| SchedulerError::job_not_found(job_key))?;
        if !job.is_scheduled() {
            return Err(SchedulerError::not_a_scheduled_job(job_key));
        }
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;
    use scheduler_domain::entities::{JobDefinition, JobInformation};
    use scheduler_domain::value_objects::JobType;
    use scheduler_infrastructure::database::memory::InMemoryJobRepository;

    mock! {
        pub Registry {}

        #[async_trait]
        impl TriggerRegistry for Registry {
            fn validate_expression(&self, cron_expression: &str) -> SchedulerResult<()>;
            async fn register(&self, job_key: &str, cron_expression: &str, paused: bool) -> SchedulerResult<()>;
            async fn unregister(&self, job_key: &str) -> SchedulerResult<bool>;
            async fn pause(&self, job_key: &str) -> SchedulerResult<bool>;
            async fn resume(&self, job_key: &str) -> SchedulerResult<bool>;
            async fn fire_now(&self, job_key: &str) -> SchedulerResult<()>;
            async fn is_scheduled(&self, job_key: &str) -> bool;
            async fn is_paused(&self, job_key: &str) -> bool;
            async fn next_fire_time(&self, job_key: &str) -> Option<DateTime<Utc>>;
            async fn scheduled_keys(&self) -> Vec<String>;
        }
    }

    fn job(key: &str, cron: Option<&str>, enabled: bool) -> Job {
        Job::new(JobDefinition {
            key: key.to_string(),
            job_type: JobType::Generic,
            information: JobInformation::new(key),
            cron_expression: cron.map(str::to_string),
            enabled,
            actions: vec![],
        })
    }

    async fn repo_with(jobs: Vec<Job>) -> Arc<InMemoryJobRepository> {
        let repo = Arc::new(InMemoryJobRepository::new());
        for job in jobs {
            repo.create(&job).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_register_disabled_job_installs_paused_trigger() {
        let mut registry = MockRegistry::new();
        registry.expect_validate_expression().returning(|_| Ok(()));
        registry
            .expect_register()
            .with(eq("NIGHTLY"), eq("0 0 2 * * *"), eq(true))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = SchedulerService::new(repo_with(vec![]).await, Arc::new(registry));
        service
            .register(&job("NIGHTLY", Some("0 0 2 * * *"), false))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_cron() {
        let mut registry = MockRegistry::new();
        registry
            .expect_validate_expression()
            .returning(|expr| Err(SchedulerError::invalid_cron(expr, "bad")));
        registry.expect_register().never();

        let service = SchedulerService::new(repo_with(vec![]).await, Arc::new(registry));
        let result = service.register(&job("NIGHTLY", Some("nope"), true)).await;
        assert!(matches!(result, Err(SchedulerError::InvalidCron { .. })));
    }

    #[tokio::test]
    async fn test_unregister_unknown_key_is_not_found() {
        let mut registry = MockRegistry::new();
        registry.expect_unregister().returning(|_| Ok(false));

        let service = SchedulerService::new(repo_with(vec![]).await, Arc::new(registry));
        let result = service.unregister("GHOST").await;
        assert!(matches!(result, Err(SchedulerError::JobNotFound { .. })));
    }

    #[tokio::test]
    async fn test_enable_persists_before_resuming() {
        let repo = repo_with(vec![job("NIGHTLY", Some("0 0 2 * * *"), false)]).await;
        let mut registry = MockRegistry::new();
        registry.expect_is_scheduled().returning(|_| true);
        registry
            .expect_resume()
            .with(eq("NIGHTLY"))
            .times(1)
            .returning(|_| Ok(true));

        let service = SchedulerService::new(repo.clone(), Arc::new(registry));
        let enabled = service.enable("NIGHTLY").await.unwrap();
        assert!(enabled.enabled);
        assert!(repo.find_by_key("NIGHTLY").await.unwrap().unwrap().enabled);
    }

    #[tokio::test]
    async fn test_enable_registers_when_no_live_trigger() {
        let repo = repo_with(vec![job("NIGHTLY", Some("0 0 2 * * *"), false)]).await;
        let mut registry = MockRegistry::new();
        registry.expect_is_scheduled().returning(|_| false);
        registry.expect_validate_expression().returning(|_| Ok(()));
        registry
            .expect_register()
            .with(eq("NIGHTLY"), eq("0 0 2 * * *"), eq(false))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = SchedulerService::new(repo, Arc::new(registry));
        service.enable("NIGHTLY").await.unwrap();
    }

    #[tokio::test]
    async fn test_redundant_enable_and_disable_are_rejected() {
        let repo = repo_with(vec![
            job("ON_JOB", Some("0 0 2 * * *"), true),
            job("OFF_JOB", Some("0 0 2 * * *"), false),
        ])
        .await;
        let service = SchedulerService::new(repo, Arc::new(MockRegistry::new()));

        assert!(matches!(
            service.enable("ON_JOB").await,
            Err(SchedulerError::JobAlreadyEnabled { .. })
        ));
        assert!(matches!(
            service.disable("OFF_JOB").await,
            Err(SchedulerError::JobAlreadyDisabled { .. })
        ));
    }

    #[tokio::test]
    async fn test_enable_unscheduled_or_unknown_job() {
        let repo = repo_with(vec![job("MANUAL_JOB", None, false)]).await;
        let service = SchedulerService::new(repo, Arc::new(MockRegistry::new()));

        assert!(matches!(
            service.enable("MANUAL_JOB").await,
            Err(SchedulerError::NotAScheduledJob { .. })
        ));
        assert!(matches!(
            service.disable("UNKNOWN").await,
            Err(SchedulerError::JobNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_reconcile_registers_enabled_scheduled_jobs_only() {
        let repo = repo_with(vec![
            job("HOURLY", Some("0 0 * * * *"), true),
            job("PAUSED", Some("0 0 * * * *"), false),
            job("MANUAL", None, true),
            job("BROKEN", Some("garbage"), true),
        ])
        .await;
        let mut registry = MockRegistry::new();
        registry.expect_validate_expression().returning(|expr| {
            if expr == "garbage" {
                Err(SchedulerError::invalid_cron(expr, "bad"))
            } else {
                Ok(())
            }
        });
        registry
            .expect_register()
            .with(eq("HOURLY"), eq("0 0 * * * *"), eq(false))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = SchedulerService::new(repo, Arc::new(registry));
        let report = service.reconcile().await.unwrap();
        assert_eq!(report.registered, vec!["HOURLY".to_string()]);
        assert_eq!(report.failed, vec!["BROKEN".to_string()]);
    }

    #[tokio::test]
    async fn test_state_projections() {
        let mut registry = MockRegistry::new();
        registry
            .expect_is_scheduled()
            .returning(|key| key != "ABSENT");
        registry
            .expect_is_paused()
            .returning(|key| key == "PAUSED_JOB");
        registry.expect_next_fire_time().returning(|_| None);

        let service = SchedulerService::new(repo_with(vec![]).await, Arc::new(registry));
        assert!(service.is_enabled("ACTIVE_JOB").await);
        assert!(!service.is_disabled("ACTIVE_JOB").await);
        assert!(service.is_disabled("PAUSED_JOB").await);
        assert!(!service.is_enabled("ABSENT").await);
        assert!(!service.is_disabled("ABSENT").await);

        let state = service.schedule_state("PAUSED_JOB").await;
        assert!(state.scheduled && !state.enabled);
    }
}
