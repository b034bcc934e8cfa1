//! Memory gauges for the memory assault

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use sysinfo::{Pid, System};
use tracing::{debug, warn};

use crate::traits::MemoryGauge;

/// Reads capacity and usage of the host process from the operating system
///
/// Capacity is total physical memory unless a lower limit is given.
pub struct SystemMemoryGauge {
    system: Mutex<System>,
    pid: Option<Pid>,
    limit_bytes: Option<u64>,
}

impl SystemMemoryGauge {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("⚠️ Cannot resolve own pid, memory usage is unavailable: {}", e);
                None
            }
        };
        let mut system = System::new();
        system.refresh_memory();
        debug!(total = system.total_memory(), "System memory gauge ready");

        Self {
            system: Mutex::new(system),
            pid,
            limit_bytes: None,
        }
    }

    /// Treat `limit_bytes` as capacity, e.g. a container limit
    pub fn with_limit(mut self, limit_bytes: u64) -> Self {
        self.limit_bytes = Some(limit_bytes);
        self
    }

    /// Same as [`with_limit`](Self::with_limit) in mebibytes, saturating on huge values
    pub fn with_limit_mb(self, limit_mb: u64) -> Self {
        self.with_limit(limit_mb.saturating_mul(1024 * 1024))
    }
}

impl Default for SystemMemoryGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGauge for SystemMemoryGauge {
    fn capacity_bytes(&self) -> u64 {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_memory();
        let total = system.total_memory();
        match self.limit_bytes {
            Some(limit) => limit.min(total),
            None => total,
        }
    }

    fn used_bytes(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        if !system.refresh_process(pid) {
            return None;
        }
        system.process(pid).map(|p| p.memory())
    }
}

/// Fixed-capacity gauge that counts only what the assault records
#[derive(Debug)]
pub struct BudgetMemoryGauge {
    capacity: u64,
    baseline: u64,
    allocated: AtomicU64,
    peak: AtomicU64,
}

impl BudgetMemoryGauge {
    pub fn new(capacity: u64) -> Self {
        Self::with_baseline(capacity, 0)
    }

    /// Gauge that starts with `baseline` bytes already in use
    pub fn with_baseline(capacity: u64, baseline: u64) -> Self {
        Self {
            capacity,
            baseline,
            allocated: AtomicU64::new(0),
            peak: AtomicU64::new(0),
        }
    }

    /// Highest amount the assault held at once
    pub fn peak_bytes(&self) -> u64 {
        self.peak.load(Ordering::SeqCst)
    }
}

impl MemoryGauge for BudgetMemoryGauge {
    fn capacity_bytes(&self) -> u64 {
        self.capacity
    }

    fn used_bytes(&self) -> Option<u64> {
        Some(self.baseline + self.allocated.load(Ordering::SeqCst))
    }

    fn record_allocation(&self, bytes: u64) {
        let now = self.allocated.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn record_release(&self, bytes: u64) {
        let _ = self
            .allocated
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_sub(bytes))
            });
    }
}
