//! Engine error types

use thiserror::Error;
use shared::{InjectedErrorKind, SharedError};

/// Result type for engine operations
pub type ChaosResult<T> = Result<T, ChaosError>;

/// Fault raised on purpose by the exception assault
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct InjectedFault {
    pub kind: InjectedErrorKind,
    pub message: String,
}

/// Engine error types
#[derive(Error, Debug)]
pub enum ChaosError {
    #[error("Injected fault: {0}")]
    Injected(InjectedFault),

    #[error("Configuration error: {0}")]
    Config(#[from] SharedError),

    #[error("Assault {assault} failed: {message}")]
    AssaultFailed { assault: String, message: String },

    #[error("Scheduler error: {message}")]
    SchedulerError { message: String },

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl ChaosError {
    /// True when this error is the product of the exception assault
    pub fn is_injected(&self) -> bool {
        matches!(self, ChaosError::Injected(_))
    }

    pub fn injected_kind(&self) -> Option<InjectedErrorKind> {
        match self {
            ChaosError::Injected(fault) => Some(fault.kind),
            _ => None,
        }
    }
}
