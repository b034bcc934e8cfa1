//! Test fixtures and data for engine tests

use std::collections::HashSet;
use std::io::Write;

use shared::{AssaultKind, ChaosConfiguration, MemoryParameters, TargetKind};
use tempfile::NamedTempFile;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const SERVICE_SIGNATURE: &'static str = "com.example.Foo#bar";
    pub const REPOSITORY_SIGNATURE: &'static str = "com.example.FooRepository#findAll";
    pub const CUSTOM_SERVICE_PREFIX: &'static str = "com.example.billing";

    /// Capacity of the budget gauge handed to the memory assault
    pub const MEMORY_BUDGET_BYTES: u64 = 8 * 1024 * 1024;

    /// Enabled, level 1, toggles off, watching SERVICE only
    pub fn service_config(active: &[AssaultKind]) -> ChaosConfiguration {
        ChaosConfiguration {
            enabled: true,
            level: 1,
            watched_targets: HashSet::from([TargetKind::Service]),
            active_assaults: active.iter().copied().collect(),
            ..Default::default()
        }
    }

    /// Fast memory ramp: four increments up to half the budget, long hold
    pub fn fast_memory() -> MemoryParameters {
        MemoryParameters {
            fill_increment_fraction: 0.125,
            fill_target_fraction: 0.5,
            millis_wait_next_increase: 20,
            millis_hold_filled: 30_000,
            millis_hold_poll: 50,
        }
    }

    pub fn config_json() -> &'static str {
        r#"{
            "enabled": true,
            "level": 1,
            "watched_targets": ["REPOSITORY"],
            "watch_custom_services": true,
            "custom_services": ["com.example.billing"],
            "excludes": ["HealthCheck"],
            "active_assaults": ["EXCEPTION"],
            "assault_parameters": {
                "exception": { "kind": "io", "message": "disk on fire" }
            }
        }"#
    }

    /// Write `contents` to a temporary file kept alive by the returned handle
    pub fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }
}
