pub mod action_dispatcher;
pub mod deferred_trigger;
pub mod fire_loop;
pub mod job_service;
pub mod scheduler_service;
pub mod task_service;

pub use action_dispatcher::ActionDispatcher;
pub use deferred_trigger::{run_deferred_trigger_loop, DeferredJobTrigger};
pub use fire_loop::run_fire_loop;
pub use job_service::JobService;
pub use scheduler_service::{ReconcileReport, ScheduleState, SchedulerService};
pub use task_service::{StatusUpdateOutcome, TaskService};
