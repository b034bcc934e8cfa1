//! Tests for memory gauges

use crate::services::memory_gauge::{BudgetMemoryGauge, SystemMemoryGauge};
use crate::traits::MemoryGauge;

#[test]
fn test_budget_gauge_tracks_allocations() {
    let gauge = BudgetMemoryGauge::with_baseline(1000, 100);
    assert_eq!(gauge.capacity_bytes(), 1000);
    assert_eq!(gauge.used_bytes(), Some(100));

    gauge.record_allocation(300);
    gauge.record_allocation(200);
    assert_eq!(gauge.used_bytes(), Some(600));
    assert_eq!(gauge.peak_bytes(), 500);

    gauge.record_release(500);
    assert_eq!(gauge.used_bytes(), Some(100));
    assert_eq!(gauge.peak_bytes(), 500);
}

#[test]
fn test_budget_gauge_release_saturates() {
    let gauge = BudgetMemoryGauge::new(1000);
    gauge.record_allocation(10);
    gauge.record_release(50);
    assert_eq!(gauge.used_bytes(), Some(0));
}

#[test]
fn test_system_gauge_reads_host() {
    let gauge = SystemMemoryGauge::new();
    assert!(gauge.capacity_bytes() > 0);
    let used = gauge.used_bytes().expect("own process usage should be readable");
    assert!(used > 0);

    let limited = SystemMemoryGauge::new().with_limit(1024);
    assert_eq!(limited.capacity_bytes(), 1024);
}

#[test]
fn test_system_gauge_limit_in_mebibytes() {
    let total = SystemMemoryGauge::new().capacity_bytes();

    assert_eq!(SystemMemoryGauge::new().with_limit_mb(1).capacity_bytes(), (1024 * 1024).min(total));
    assert_eq!(SystemMemoryGauge::new().with_limit_mb(u64::MAX).capacity_bytes(), total);
}
