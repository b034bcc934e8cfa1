//! Engine services implementations

pub mod event_sink;
pub mod memory_gauge;
pub mod scheduler;
pub mod toggle_store;
pub mod watchers;

#[cfg(test)]
pub mod tests;

pub use event_sink::*;
pub use memory_gauge::*;
pub use scheduler::*;
pub use toggle_store::*;
pub use watchers::*;
