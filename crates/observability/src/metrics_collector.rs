use metrics::{counter, describe_counter};

pub const JOBS_FIRED_TOTAL: &str = "scheduler_jobs_fired_total";
pub const TASKS_CREATED_TOTAL: &str = "scheduler_tasks_created_total";
pub const TASK_STATUS_UPDATES_TOTAL: &str = "scheduler_task_status_updates_total";
pub const ACTIONS_DISPATCHED_TOTAL: &str = "scheduler_actions_dispatched_total";
pub const ACTION_DISPATCH_FAILURES_TOTAL: &str = "scheduler_action_dispatch_failures_total";
pub const TRIGGER_REGISTRATIONS_TOTAL: &str = "scheduler_trigger_registrations_total";
pub const RECONCILIATION_FAILURES_TOTAL: &str = "scheduler_reconciliation_failures_total";

/// 调度核心的指标上报
///
/// 未安装记录器时 `metrics` 宏为空操作，测试中可以直接调用。
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn describe() {
        describe_counter!(JOBS_FIRED_TOTAL, "Job firings by source");
        describe_counter!(TASKS_CREATED_TOTAL, "Tasks created for fired jobs");
        describe_counter!(TASK_STATUS_UPDATES_TOTAL, "Task status updates by status");
        describe_counter!(ACTIONS_DISPATCHED_TOTAL, "Actions dispatched by action type");
        describe_counter!(
            ACTION_DISPATCH_FAILURES_TOTAL,
            "Action dispatch failures by action type"
        );
        describe_counter!(TRIGGER_REGISTRATIONS_TOTAL, "Live trigger registrations");
        describe_counter!(
            RECONCILIATION_FAILURES_TOTAL,
            "Jobs that failed to register during startup reconciliation"
        );
    }

    pub fn record_job_fired(source: &'static str) {
        counter!(JOBS_FIRED_TOTAL, "source" => source).increment(1);
    }

    pub fn record_task_created() {
        counter!(TASKS_CREATED_TOTAL).increment(1);
    }

    pub fn record_status_update(status: &'static str) {
        counter!(TASK_STATUS_UPDATES_TOTAL, "status" => status).increment(1);
    }

    pub fn record_action_dispatched(action_type: &'static str) {
        counter!(ACTIONS_DISPATCHED_TOTAL, "action_type" => action_type).increment(1);
    }

    pub fn record_action_dispatch_failure(action_type: &'static str) {
        counter!(ACTION_DISPATCH_FAILURES_TOTAL, "action_type" => action_type).increment(1);
    }

    pub fn record_trigger_registered() {
        counter!(TRIGGER_REGISTRATIONS_TOTAL).increment(1);
    }

    pub fn record_reconciliation_failures(count: u64) {
        counter!(RECONCILIATION_FAILURES_TOTAL).increment(count);
    }
}
