//! Test doubles for the domain ports

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use scheduler_domain::ports::TriggerRegistry;
use scheduler_errors::{SchedulerError, SchedulerResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTrigger {
    pub cron_expression: String,
    pub paused: bool,
}

/// In-memory trigger registry that records every call
///
/// Expressions are accepted unless registered with [`Self::reject_expression`].
/// `fire_now` only records the key; nothing is delivered to a fire loop.
#[derive(Debug, Clone, Default)]
pub struct RecordingTriggerRegistry {
    triggers: Arc<Mutex<HashMap<String, RecordedTrigger>>>,
    fired: Arc<Mutex<Vec<String>>>,
    rejected: Arc<Mutex<HashSet<String>>>,
}

impl RecordingTriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_expression(&self, cron_expression: &str) {
        self.rejected
            .lock()
            .unwrap()
            .insert(cron_expression.to_string());
    }

    pub fn fired(&self) -> Vec<String> {
        self.fired.lock().unwrap().clone()
    }

    pub fn trigger(&self, job_key: &str) -> Option<RecordedTrigger> {
        self.triggers.lock().unwrap().get(job_key).cloned()
    }

    pub fn count(&self) -> usize {
        self.triggers.lock().unwrap().len()
    }
}

#[async_trait]
impl TriggerRegistry for RecordingTriggerRegistry {
    fn validate_expression(&self, cron_expression: &str) -> SchedulerResult<()> {
        if cron_expression.trim().is_empty() || self.rejected.lock().unwrap().contains(cron_expression) {
            return Err(SchedulerError::invalid_cron(cron_expression, "rejected by test registry"));
        }
        Ok(())
    }

    async fn register(
        &self,
        job_key: &str,
        cron_expression: &str,
        paused: bool,
    ) -> SchedulerResult<()> {
        self.validate_expression(cron_expression)?;
        self.triggers.lock().unwrap().insert(
            job_key.to_string(),
            RecordedTrigger {
                cron_expression: cron_expression.to_string(),
                paused,
            },
        );
        Ok(())
    }

    async fn unregister(&self, job_key: &str) -> SchedulerResult<bool> {
        Ok(self.triggers.lock().unwrap().remove(job_key).is_some())
    }

    async fn pause(&self, job_key: &str) -> SchedulerResult<bool> {
        Ok(self
            .triggers
            .lock()
            .unwrap()
            .get_mut(job_key)
            .map(|trigger| trigger.paused = true)
            .is_some())
    }

    async fn resume(&self, job_key: &str) -> SchedulerResult<bool> {
        Ok(self
            .triggers
            .lock()
            .unwrap()
            .get_mut(job_key)
            .map(|trigger| trigger.paused = false)
            .is_some())
    }

    async fn fire_now(&self, job_key: &str) -> SchedulerResult<()> {
        self.fired.lock().unwrap().push(job_key.to_string());
        Ok(())
    }

    async fn is_scheduled(&self, job_key: &str) -> bool {
        self.triggers.lock().unwrap().contains_key(job_key)
    }

    async fn is_paused(&self, job_key: &str) -> bool {
        self.trigger(job_key).map(|t| t.paused).unwrap_or(false)
    }

    async fn next_fire_time(&self, job_key: &str) -> Option<DateTime<Utc>> {
        match self.trigger(job_key) {
            Some(trigger) if !trigger.paused => Some(Utc::now() + Duration::minutes(1)),
            _ => None,
        }
    }

    async fn scheduled_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.triggers.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}
