pub mod api_observability;
pub mod app_config;
pub mod database;
pub mod scheduler;

pub use api_observability::{ApiConfig, LogFormat, ObservabilityConfig};
pub use app_config::AppConfig;
pub use database::{DatabaseBackend, DatabaseConfig};
pub use scheduler::SchedulerConfig;
