//! Engine-specific data types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{AssaultKind, TargetKind};
use uuid::Uuid;

/// Call site reported by an interceptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSignature {
    pub target: TargetKind,
    pub signature: String,
}

impl CallSignature {
    pub fn new(target: TargetKind, signature: impl Into<String>) -> Self {
        Self {
            target,
            signature: signature.into(),
        }
    }
}

impl fmt::Display for CallSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.target, self.signature)
    }
}

/// Where an assault is allowed to be triggered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Fired from an intercepted call
    Request,
    /// Fired from the scheduler, independent of call volume
    Runtime,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Request => write!(f, "request"),
            Capability::Runtime => write!(f, "runtime"),
        }
    }
}

/// Lifecycle of the memory assault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MemoryAssaultState {
    Idle = 0,
    Filling = 1,
    Holding = 2,
    Releasing = 3,
}

impl MemoryAssaultState {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => MemoryAssaultState::Filling,
            2 => MemoryAssaultState::Holding,
            3 => MemoryAssaultState::Releasing,
            _ => MemoryAssaultState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, MemoryAssaultState::Filling | MemoryAssaultState::Holding)
    }
}

/// Result of one evaluation or scheduled run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOutcome {
    /// Master switch is off; never published
    ChaosDisabled,
    SkippedNotWatched,
    SkippedToggleOff,
    SkippedProbability,
    NoActiveAssault,
    Fired(AssaultKind),
    MemoryFilled { bytes: u64 },
    MemoryReleased { bytes: u64 },
}

impl EventOutcome {
    /// Stable metric label for this outcome
    pub fn label(&self) -> String {
        match self {
            EventOutcome::ChaosDisabled => "disabled".to_string(),
            EventOutcome::SkippedNotWatched => "skipped.not-watched".to_string(),
            EventOutcome::SkippedToggleOff => "skipped.toggle-off".to_string(),
            EventOutcome::SkippedProbability => "skipped.probability".to_string(),
            EventOutcome::NoActiveAssault => "skipped.no-active-assault".to_string(),
            EventOutcome::Fired(kind) => format!("fired.{kind}"),
            EventOutcome::MemoryFilled { .. } => "memory.filled".to_string(),
            EventOutcome::MemoryReleased { .. } => "memory.released".to_string(),
        }
    }

    pub fn fired(&self) -> Option<AssaultKind> {
        match self {
            EventOutcome::Fired(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Notification handed to the event sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// `None` for scheduler-triggered assaults
    pub target: Option<TargetKind>,
    pub signature: Option<String>,
    pub outcome: EventOutcome,
}

impl ChaosEvent {
    pub fn for_call(call: &CallSignature, outcome: EventOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            target: Some(call.target),
            signature: Some(call.signature.clone()),
            outcome,
        }
    }

    pub fn runtime(outcome: EventOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            target: None,
            signature: None,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_state_round_trip() {
        for state in [
            MemoryAssaultState::Idle,
            MemoryAssaultState::Filling,
            MemoryAssaultState::Holding,
            MemoryAssaultState::Releasing,
        ] {
            assert_eq!(MemoryAssaultState::from_u8(state as u8), state);
        }
        assert!(MemoryAssaultState::Holding.is_running());
        assert!(!MemoryAssaultState::Releasing.is_running());
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(EventOutcome::Fired(AssaultKind::KillApp).label(), "fired.kill-app");
        assert_eq!(EventOutcome::SkippedNotWatched.label(), "skipped.not-watched");
        assert_eq!(EventOutcome::Fired(AssaultKind::Memory).fired(), Some(AssaultKind::Memory));
    }

    #[test]
    fn test_runtime_event_has_no_call_site() {
        let event = ChaosEvent::runtime(EventOutcome::Fired(AssaultKind::Memory));
        assert!(event.target.is_none());
        assert!(event.signature.is_none());

        let call = CallSignature::new(TargetKind::Service, "com.example.Foo#bar");
        let event = ChaosEvent::for_call(&call, EventOutcome::SkippedProbability);
        assert_eq!(event.target, Some(TargetKind::Service));
        assert_eq!(call.to_string(), "service:com.example.Foo#bar");
    }
}
