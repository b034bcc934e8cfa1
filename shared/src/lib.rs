//! Shared types for the chaos monkey workspace
//!
//! Contains the configuration model and the vocabulary (target kinds, assault kinds,
//! schedules) that the engine and its collaborators agree on.

pub mod config;
pub mod errors;
pub mod logging;
pub mod types;

pub use config::{
    AssaultParameters, ChaosConfiguration, ConfigurationUpdate, ExceptionSpec, KillAppParameters,
    LatencyParameters, MemoryParameters, DEFAULT_TOGGLE_PREFIX,
};
pub use errors::*;
pub use types::*;
