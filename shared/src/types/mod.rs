//! Core vocabulary shared by the engine and its collaborators

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod schedule;

pub use schedule::ScheduleSpec;

/// Category of an intercepted call site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    Controller,
    RestController,
    Service,
    Component,
    Repository,
    ActuatorHealth,
    RestClientCall,
}

impl TargetKind {
    pub const ALL: [TargetKind; 7] = [
        TargetKind::Controller,
        TargetKind::RestController,
        TargetKind::Service,
        TargetKind::Component,
        TargetKind::Repository,
        TargetKind::ActuatorHealth,
        TargetKind::RestClientCall,
    ];

    /// Lower-case name used in toggle names and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Controller => "controller",
            TargetKind::RestController => "rest-controller",
            TargetKind::Service => "service",
            TargetKind::Component => "component",
            TargetKind::Repository => "repository",
            TargetKind::ActuatorHealth => "actuator-health",
            TargetKind::RestClientCall => "rest-client-call",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "controller" => Ok(TargetKind::Controller),
            "rest-controller" => Ok(TargetKind::RestController),
            "service" => Ok(TargetKind::Service),
            "component" => Ok(TargetKind::Component),
            "repository" => Ok(TargetKind::Repository),
            "actuator-health" | "health" => Ok(TargetKind::ActuatorHealth),
            "rest-client-call" | "rest-client" => Ok(TargetKind::RestClientCall),
            _ => Err(format!("Unknown target kind: {s}")),
        }
    }
}

/// The fault-injection behaviours the engine knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssaultKind {
    Latency,
    Exception,
    KillApp,
    Memory,
}

impl AssaultKind {
    pub const ALL: [AssaultKind; 4] = [
        AssaultKind::Latency,
        AssaultKind::Exception,
        AssaultKind::KillApp,
        AssaultKind::Memory,
    ];
}

impl fmt::Display for AssaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssaultKind::Latency => write!(f, "latency"),
            AssaultKind::Exception => write!(f, "exception"),
            AssaultKind::KillApp => write!(f, "kill-app"),
            AssaultKind::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for AssaultKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "latency" => Ok(AssaultKind::Latency),
            "exception" => Ok(AssaultKind::Exception),
            "kill-app" | "killapp" => Ok(AssaultKind::KillApp),
            "memory" => Ok(AssaultKind::Memory),
            _ => Err(format!("Unknown assault kind: {s}")),
        }
    }
}

/// Error kinds the exception assault can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InjectedErrorKind {
    Runtime,
    IllegalState,
    IllegalArgument,
    Timeout,
    Io,
    Unavailable,
}

impl fmt::Display for InjectedErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectedErrorKind::Runtime => write!(f, "runtime"),
            InjectedErrorKind::IllegalState => write!(f, "illegal-state"),
            InjectedErrorKind::IllegalArgument => write!(f, "illegal-argument"),
            InjectedErrorKind::Timeout => write!(f, "timeout"),
            InjectedErrorKind::Io => write!(f, "io"),
            InjectedErrorKind::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl std::str::FromStr for InjectedErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "runtime" => Ok(InjectedErrorKind::Runtime),
            "illegal-state" => Ok(InjectedErrorKind::IllegalState),
            "illegal-argument" => Ok(InjectedErrorKind::IllegalArgument),
            "timeout" => Ok(InjectedErrorKind::Timeout),
            "io" => Ok(InjectedErrorKind::Io),
            "unavailable" => Ok(InjectedErrorKind::Unavailable),
            _ => Err(format!("Unknown error kind: {s}")),
        }
    }
}
