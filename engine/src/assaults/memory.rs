//! Memory assault: fill, hold, release
//!
//! State machine `Idle -> Filling -> Holding -> Releasing -> Idle`. At most one fill runs per
//! assault instance; a trigger while one is in flight is a no-op. Cancellation is cooperative:
//! a request bit kept in the state word and the live configuration are polled before every
//! increment and on every hold sub-interval. Release runs from a drop guard so it happens on
//! every exit path.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use shared::{AssaultKind, ChaosConfiguration, MemoryParameters};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{ChaosError, ChaosResult};
use crate::state::SharedConfig;
use crate::traits::{ChaosAssault, EventSink, MemoryGauge};
use crate::types::{Capability, ChaosEvent, EventOutcome, MemoryAssaultState};

/// Byte pattern written into every block so the pages are actually committed
const FILL_PATTERN: u8 = 0xA5;

/// Set on top of a running state when a cancel was requested; cleared only by returning to idle
const CANCEL_REQUESTED: u8 = 0x80;

/// How a fill ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FillEnd {
    Reached,
    Cancelled,
    UsageUnavailable,
}

pub struct MemoryAssault {
    config: SharedConfig,
    gauge: Arc<dyn MemoryGauge>,
    events: Arc<dyn EventSink>,
    state: AtomicU8,
    held_bytes: AtomicU64,
}

impl MemoryAssault {
    pub fn new(config: SharedConfig, gauge: Arc<dyn MemoryGauge>, events: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            gauge,
            events,
            state: AtomicU8::new(MemoryAssaultState::Idle as u8),
            held_bytes: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> MemoryAssaultState {
        MemoryAssaultState::from_u8(self.state.load(Ordering::SeqCst) & !CANCEL_REQUESTED)
    }

    /// Whether the running fill has been asked to stop
    pub fn cancel_requested(&self) -> bool {
        self.state.load(Ordering::SeqCst) & CANCEL_REQUESTED != 0
    }

    /// Bytes currently owned by the running fill
    pub fn held_bytes(&self) -> u64 {
        self.held_bytes.load(Ordering::SeqCst)
    }

    /// Move between running states, keeping a pending cancel request
    fn set_state(&self, state: MemoryAssaultState) {
        let _ = self.state.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
            Some(state as u8 | (current & CANCEL_REQUESTED))
        });
    }

    /// Size of the next allocation, `None` once the target is reached
    ///
    /// The target is met by whichever is larger: the usage the gauge reports or the bytes this
    /// fill already holds. Capped at the remaining distance so one step cannot overshoot it.
    pub fn next_increment(params: &MemoryParameters, capacity: u64, used: u64, held: u64) -> Option<u64> {
        let target = (capacity as f64 * params.fill_target_fraction) as u64;
        let filled = used.max(held);
        if filled >= target {
            return None;
        }
        let increment = (capacity as f64 * params.fill_increment_fraction) as u64;
        Some(increment.min(target - filled).max(1))
    }

    async fn should_stop(&self) -> bool {
        if self.cancel_requested() {
            return true;
        }
        let config = self.config.snapshot().await;
        !config.enabled || !config.is_assault_active(AssaultKind::Memory)
    }

    async fn fill(&self, held: &mut HeldMemory<'_>) -> FillEnd {
        loop {
            if self.should_stop().await {
                return FillEnd::Cancelled;
            }

            let params = self.config.snapshot().await.assault_parameters.memory;
            let capacity = self.gauge.capacity_bytes();
            let Some(used) = self.gauge.used_bytes() else {
                return FillEnd::UsageUnavailable;
            };
            let Some(increment) = Self::next_increment(&params, capacity, used, held.bytes) else {
                return FillEnd::Reached;
            };

            if !held.allocate(increment) {
                warn!(bytes = increment, "⚠️ Allocation refused, holding what was filled so far");
                return FillEnd::Reached;
            }

            let Some(used) = self.gauge.used_bytes() else {
                return FillEnd::UsageUnavailable;
            };
            debug!(held = held.bytes, used, capacity, "Memory assault increment");

            if Self::next_increment(&params, capacity, used, held.bytes).is_none() {
                return FillEnd::Reached;
            }
            tokio::time::sleep(params.wait_next_increase()).await;
        }
    }

    /// Fill, hold, release; the caller has already moved the state to `Filling`
    async fn run(&self) -> ChaosResult<()> {
        info!("🧠 Chaos Monkey - memory assault started");

        let mut held = HeldMemory::new(self);
        match self.fill(&mut held).await {
            FillEnd::Reached => {
                self.set_state(MemoryAssaultState::Holding);
                self.events
                    .publish(ChaosEvent::runtime(EventOutcome::MemoryFilled { bytes: held.bytes }));
                info!(bytes = held.bytes, "🧠 Memory filled, holding");
                self.hold().await;
                Ok(())
            }
            FillEnd::Cancelled => {
                info!(bytes = held.bytes, "Memory assault cancelled while filling");
                Ok(())
            }
            FillEnd::UsageUnavailable => {
                warn!(bytes = held.bytes, "⚠️ Memory usage unreadable, abandoning fill");
                drop(held);
                Err(ChaosError::AssaultFailed {
                    assault: AssaultKind::Memory.to_string(),
                    message: "memory usage could not be read".to_string(),
                })
            }
        }
    }

    async fn hold(&self) {
        let params = self.config.snapshot().await.assault_parameters.memory;
        let deadline = Instant::now() + params.hold_filled();

        loop {
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            if self.should_stop().await {
                info!("Memory assault cancelled while holding");
                return;
            }
            tokio::time::sleep(params.hold_poll().min(deadline - now)).await;
        }
    }
}

/// Blocks owned by one running fill; dropping it performs the release
struct HeldMemory<'a> {
    assault: &'a MemoryAssault,
    blocks: Vec<Vec<u8>>,
    bytes: u64,
}

impl<'a> HeldMemory<'a> {
    fn new(assault: &'a MemoryAssault) -> Self {
        Self {
            assault,
            blocks: Vec::new(),
            bytes: 0,
        }
    }

    fn allocate(&mut self, bytes: u64) -> bool {
        let Ok(size) = usize::try_from(bytes) else {
            return false;
        };
        let mut block = Vec::new();
        if block.try_reserve_exact(size).is_err() {
            return false;
        }
        block.resize(size, FILL_PATTERN);

        self.blocks.push(block);
        self.bytes += bytes;
        self.assault.gauge.record_allocation(bytes);
        self.assault.held_bytes.store(self.bytes, Ordering::SeqCst);
        true
    }
}

impl Drop for HeldMemory<'_> {
    fn drop(&mut self) {
        self.assault.set_state(MemoryAssaultState::Releasing);

        let released = self.bytes;
        self.blocks.clear();
        self.blocks.shrink_to_fit();
        self.bytes = 0;
        self.assault.gauge.record_release(released);
        self.assault.held_bytes.store(0, Ordering::SeqCst);

        if released > 0 {
            self.assault
                .events
                .publish(ChaosEvent::runtime(EventOutcome::MemoryReleased { bytes: released }));
            info!(bytes = released, "♻️ Chaos Monkey - memory released");
        }

        self.assault
            .state
            .store(MemoryAssaultState::Idle as u8, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChaosAssault for MemoryAssault {
    fn kind(&self) -> AssaultKind {
        AssaultKind::Memory
    }

    fn supports(&self, capability: Capability, _config: &ChaosConfiguration) -> bool {
        capability == Capability::Runtime
    }

    fn runs_in_background(&self) -> bool {
        true
    }

    async fn attack(&self, _config: &ChaosConfiguration) -> ChaosResult<()> {
        let acquired = self.state.compare_exchange(
            MemoryAssaultState::Idle as u8,
            MemoryAssaultState::Filling as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        if acquired.is_err() {
            debug!(state = ?self.state(), "Memory assault already running, ignoring trigger");
            return Ok(());
        }
        self.run().await
    }

    fn cancel(&self) {
        let requested = self.state.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
            MemoryAssaultState::from_u8(current & !CANCEL_REQUESTED)
                .is_running()
                .then_some(current | CANCEL_REQUESTED)
        });
        if requested.is_ok() {
            info!("🛑 Cancelling memory assault");
        }
    }

    fn interrupt(&self) {
        self.cancel();
    }
}
