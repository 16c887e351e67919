pub mod trigger_registry;

pub use trigger_registry::TriggerRegistry;
