//! # Scheduler Testing Utils
//!
//! Shared testing utilities for the job scheduler workspace: builders for
//! domain entities, a recording trigger registry and polling helpers.
//!
//! ```toml
//! [dev-dependencies]
//! scheduler-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
