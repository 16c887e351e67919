pub mod entities;
pub mod events;
pub mod ports;
pub mod repositories;
pub mod update_value;
pub mod value_objects;

pub use entities::*;
pub use events::*;
pub use ports::*;
pub use repositories::*;
pub use scheduler_errors::{SchedulerError, SchedulerResult};
pub use update_value::UpdateValue;
pub use value_objects::*;
