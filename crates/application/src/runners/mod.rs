pub mod run_job;

pub use run_job::RunJobActionRunner;
