//! Trait definitions for dependency injection
//!
//! Every collaborator of the decision engine sits behind one of these traits so hosts can
//! swap implementations and tests can substitute mocks.

use async_trait::async_trait;

use shared::{AssaultKind, ChaosConfiguration};
use crate::error::ChaosResult;
use crate::types::{CallSignature, Capability, ChaosEvent};

/// A single fault-injection behaviour
#[mockall::automock]
#[async_trait]
pub trait ChaosAssault: Send + Sync {
    /// Which assault this is
    fn kind(&self) -> AssaultKind;

    /// Whether the assault may be fired from the given trigger site
    fn supports(&self, capability: Capability, config: &ChaosConfiguration) -> bool;

    /// Long-running assaults are dispatched to a background task instead of the caller
    fn runs_in_background(&self) -> bool;

    /// Run the assault once with the given configuration snapshot
    async fn attack(&self, config: &ChaosConfiguration) -> ChaosResult<()>;

    /// Ask in-flight work that outlives a single call to wind down
    fn cancel(&self);

    /// Stop everything in flight, including per-call sleeps; used at host shutdown
    fn interrupt(&self);
}

/// Fire-and-forget destination for chaos events
///
/// Implementations must not block the evaluating caller.
#[mockall::automock]
pub trait EventSink: Send + Sync {
    fn publish(&self, event: ChaosEvent);
}

/// Store of per-signature feature toggles
#[mockall::automock]
#[async_trait]
pub trait ChaosToggles: Send + Sync {
    /// Configured value of a toggle, `None` when the toggle is not provisioned
    async fn is_enabled(&self, toggle_name: &str) -> Option<bool>;
}

/// Naming strategy from call signature to toggle name
#[mockall::automock]
pub trait ToggleNameMapper: Send + Sync {
    fn map_name(&self, prefix: &str, call: &CallSignature) -> String;
}

/// Ends the host process
#[mockall::automock]
pub trait ProcessTerminator: Send + Sync {
    /// Does not return in production implementations
    fn terminate(&self, exit_code: i32);
}

/// View of the memory subsystem the memory assault applies pressure to
pub trait MemoryGauge: Send + Sync {
    /// Maximum capacity in bytes
    fn capacity_bytes(&self) -> u64;

    /// Current usage in bytes, `None` when it cannot be read
    fn used_bytes(&self) -> Option<u64>;

    /// Called after the assault allocated `bytes`
    fn record_allocation(&self, _bytes: u64) {}

    /// Called after the assault dropped `bytes`
    fn record_release(&self, _bytes: u64) {}
}
