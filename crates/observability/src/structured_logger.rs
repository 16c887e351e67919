use tracing::{error, info, warn};

/// 领域事件日志，统一字段命名
pub struct StructuredLogger;

impl StructuredLogger {
    pub fn log_job_fired(job_key: &str, source: &str, task_id: i64) {
        info!(
            event = "job_fired",
            job.key = job_key,
            fire.source = source,
            task.id = task_id,
            "作业 {} 已触发, 创建任务 {}",
            job_key,
            task_id
        );
    }

    pub fn log_job_fire_failed(job_key: &str, source: &str, error: &str) {
        error!(
            event = "job_fire_failed",
            job.key = job_key,
            fire.source = source,
            error = error,
            "作业 {} 触发失败: {}",
            job_key,
            error
        );
    }

    pub fn log_task_status_updated(
        job_key: &str,
        task_id: i64,
        previous: &str,
        current: &str,
        matched_actions: usize,
    ) {
        info!(
            event = "task_status_updated",
            job.key = job_key,
            task.id = task_id,
            task.previous_status = previous,
            task.status = current,
            actions.matched = matched_actions,
            "任务 {} 状态 {} -> {}",
            task_id,
            previous,
            current
        );
    }

    pub fn log_action_dispatched(job_key: &str, task_id: i64, action_type: &str, position: usize) {
        info!(
            event = "action_dispatched",
            job.key = job_key,
            task.id = task_id,
            action.type = action_type,
            action.position = position,
            "作业 {} 的动作 #{} ({}) 已分发",
            job_key,
            position,
            action_type
        );
    }

    pub fn log_action_dispatch_failed(
        job_key: &str,
        task_id: i64,
        action_type: &str,
        position: usize,
        error: &str,
    ) {
        error!(
            event = "action_dispatch_failed",
            job.key = job_key,
            task.id = task_id,
            action.type = action_type,
            action.position = position,
            error = error,
            "作业 {} 的动作 #{} ({}) 分发失败: {}",
            job_key,
            position,
            action_type,
            error
        );
    }

    pub fn log_trigger_registered(job_key: &str, cron_expression: &str, paused: bool) {
        info!(
            event = "trigger_registered",
            job.key = job_key,
            job.cron = cron_expression,
            trigger.paused = paused,
            "作业 {} 已注册触发器",
            job_key
        );
    }

    pub fn log_trigger_unregistered(job_key: &str) {
        info!(
            event = "trigger_unregistered",
            job.key = job_key,
            "作业 {} 的触发器已移除",
            job_key
        );
    }

    pub fn log_reconciliation_complete(registered: usize, failed: usize) {
        if failed == 0 {
            info!(
                event = "reconciliation_complete",
                reconcile.registered = registered,
                reconcile.failed = failed,
                "启动对账完成, 注册 {} 个作业",
                registered
            );
        } else {
            warn!(
                event = "reconciliation_complete",
                reconcile.registered = registered,
                reconcile.failed = failed,
                "启动对账完成, 注册 {} 个作业, {} 个失败",
                registered,
                failed
            );
        }
    }
}
