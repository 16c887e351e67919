pub mod action_runner;
pub mod job_trigger;

pub use action_runner::ActionRunner;
pub use job_trigger::JobTrigger;
