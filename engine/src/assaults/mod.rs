//! Assault implementations

pub mod exception;
pub mod kill_app;
pub mod latency;
pub mod memory;

use std::sync::Arc;

pub use exception::ExceptionAssault;
#[cfg(unix)]
pub use kill_app::SignalTerminator;
pub use kill_app::{ExitTerminator, KillAppAssault};
pub use latency::LatencyAssault;
pub use memory::MemoryAssault;

use crate::core::AssaultRegistry;
use crate::state::SharedConfig;
use crate::traits::{EventSink, MemoryGauge, ProcessTerminator};

/// Registry holding all four assaults
pub fn standard_registry(
    config: SharedConfig,
    gauge: Arc<dyn MemoryGauge>,
    terminator: Arc<dyn ProcessTerminator>,
    events: Arc<dyn EventSink>,
) -> AssaultRegistry {
    AssaultRegistry::new()
        .with(Arc::new(LatencyAssault::new()))
        .with(Arc::new(ExceptionAssault::new()))
        .with(Arc::new(KillAppAssault::new(terminator)))
        .with(Arc::new(MemoryAssault::new(config, gauge, events)))
}
