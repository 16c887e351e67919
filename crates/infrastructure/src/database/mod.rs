pub mod memory;
pub mod sqlite;

pub use memory::{InMemoryJobRepository, InMemoryTaskRepository};
pub use sqlite::{DatabaseManager, SqliteJobRepository, SqliteTaskRepository};
