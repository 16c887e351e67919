//! 领域事件
//!
//! 触发器与服务之间通过事件解耦

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 触发来源
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FireSource {
    /// CRON 定时触发
    Schedule,
    /// 手动或动作链触发
    Manual,
}

/// 触发器发出的作业触发事件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobFireEvent {
    pub id: Uuid,
    pub job_key: String,
    pub source: FireSource,
    pub fired_at: DateTime<Utc>,
}

impl JobFireEvent {
    pub fn new<S: Into<String>>(job_key: S, source: FireSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_key: job_key.into(),
            source,
            fired_at: Utc::now(),
        }
    }

    pub fn scheduled<S: Into<String>>(job_key: S) -> Self {
        Self::new(job_key, FireSource::Schedule)
    }

    pub fn manual<S: Into<String>>(job_key: S) -> Self {
        Self::new(job_key, FireSource::Manual)
    }
}
