use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

use scheduler_errors::{SchedulerError, SchedulerResult};

/// CRON表达式解析和调度工具
///
/// 表达式带秒字段：`秒 分 时 日 月 周 [年]`
#[derive(Debug, Clone)]
pub struct CronScheduler {
    expression: String,
    schedule: Schedule,
}

impl CronScheduler {
    pub fn new(cron_expr: &str) -> SchedulerResult<Self> {
        let schedule = Schedule::from_str(cron_expr)
            .map_err(|e| SchedulerError::invalid_cron(cron_expr, e.to_string()))?;

        Ok(Self {
            expression: cron_expr.to_string(),
            schedule,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// 严格晚于 `from` 的下一次执行时间
    pub fn next_execution_time(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&from).next()
    }

    pub fn validate_cron_expression(cron_expr: &str) -> SchedulerResult<()> {
        Self::new(cron_expr).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_valid_expressions() {
        assert!(CronScheduler::validate_cron_expression("0 0 12 * * *").is_ok());
        assert!(CronScheduler::validate_cron_expression("0 */5 * * * *").is_ok());
        assert!(CronScheduler::validate_cron_expression("0 0 9 * * Mon-Fri").is_ok());
    }

    #[test]
    fn test_invalid_expression_is_invalid_cron() {
        let result = CronScheduler::new("not a cron");
        match result {
            Err(SchedulerError::InvalidCron { expr, .. }) => assert_eq!(expr, "not a cron"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_next_execution_time() {
        let scheduler = CronScheduler::new("0 0 * * * *").unwrap();
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap();

        let next = scheduler.next_execution_time(from).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap());

        let following = scheduler.next_execution_time(next).unwrap();
        assert_eq!(following, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        assert_eq!(scheduler.expression(), "0 0 * * * *");
    }
}
