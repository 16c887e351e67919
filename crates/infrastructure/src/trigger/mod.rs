pub mod cron_trigger_registry;
pub mod cron_utils;

pub use cron_trigger_registry::CronTriggerRegistry;
pub use cron_utils::CronScheduler;
