//! Chaos engine library
//!
//! Decides, for every intercepted call site and on a periodic schedule, whether to inject a
//! fault (latency, exception, process kill, memory pressure) and carries the fault out.

pub mod assaults;
pub mod core;
pub mod engine_impl;
pub mod error;
pub mod services;
pub mod state;
pub mod traits;
pub mod types;

// Re-export main types
pub use assaults::standard_registry;
pub use crate::core::{AssaultRegistry, PrefixToggleNameMapper, ProbabilitySelector, ToggleEvaluator};
pub use engine_impl::ChaosEngine;
pub use error::{ChaosError, ChaosResult, InjectedFault};
pub use services::*;
pub use state::SharedConfig;
pub use traits::*;
pub use types::*;
