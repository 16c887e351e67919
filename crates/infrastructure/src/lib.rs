pub mod database;
pub mod error_handling;
pub mod repository_factory;
pub mod trigger;

pub use database::*;
pub use repository_factory::{Repositories, RepositoryFactory};
pub use trigger::{CronScheduler, CronTriggerRegistry};
