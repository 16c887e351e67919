//! Test data builders for creating domain entities with sensible defaults

use chrono::{DateTime, Utc};
use scheduler_domain::entities::{Action, Job, JobDefinition, JobInformation, Task};
use scheduler_domain::value_objects::{ConditionType, JobType, TaskStatus};

/// Builder for job definitions and persisted jobs
pub struct JobBuilder {
    definition: JobDefinition,
}

impl JobBuilder {
    pub fn new(key: &str) -> Self {
        Self {
            definition: JobDefinition {
                key: key.to_string(),
                job_type: JobType::Generic,
                information: JobInformation::new(format!("{key} job")),
                cron_expression: None,
                enabled: true,
                actions: vec![],
            },
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.definition.information.name = name.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.definition.information.description = Some(description.to_string());
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.definition.information.tags.insert(tag.to_string());
        self
    }

    pub fn with_cron(mut self, cron_expression: &str) -> Self {
        self.definition.cron_expression = Some(cron_expression.to_string());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.definition.enabled = enabled;
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.definition.actions.push(action);
        self
    }

    pub fn on_success_run(self, target_job_key: &str) -> Self {
        self.with_action(Action::run_job(ConditionType::OnSuccess, target_job_key))
    }

    pub fn on_failure_run(self, target_job_key: &str) -> Self {
        self.with_action(Action::run_job(ConditionType::OnFailure, target_job_key))
    }

    pub fn definition(self) -> JobDefinition {
        self.definition
    }

    pub fn build(self) -> Job {
        Job::new(self.definition)
    }
}

/// Builder for task entities
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(job_key: &str) -> Self {
        Self {
            task: Task::new(job_key),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.task.id = id;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.task.message = Some(message.to_string());
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.task.created_at = created_at;
        self.task.updated_at = created_at;
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}
