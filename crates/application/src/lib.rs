pub mod context;
pub mod ports;
pub mod runners;
pub mod services;

pub use context::SchedulerContext;
pub use ports::{ActionRunner, JobTrigger};
pub use runners::RunJobActionRunner;
pub use services::*;
