//! Tests for engine services
//!
//! Engines under test are built from real assaults where timing allows and from mocks where a
//! call count matters.

pub mod event_sink;
pub mod memory_gauge;
pub mod toggle_store;

use std::collections::HashSet;
use std::sync::Arc;

use shared::{AssaultKind, ChaosConfiguration, TargetKind};

use crate::core::{AssaultRegistry, ToggleEvaluator};
use crate::engine_impl::ChaosEngine;
use crate::services::{EventCounter, InMemoryToggles};
use crate::state::SharedConfig;

/// Enabled, level 1, toggles off, watching `targets`, with `active` assaults
pub fn chaos_config(targets: &[TargetKind], active: &[AssaultKind]) -> ChaosConfiguration {
    ChaosConfiguration {
        enabled: true,
        level: 1,
        watched_targets: targets.iter().copied().collect::<HashSet<_>>(),
        active_assaults: active.iter().copied().collect::<HashSet<_>>(),
        ..Default::default()
    }
}

pub fn build_engine(config: ChaosConfiguration, registry: AssaultRegistry) -> (Arc<ChaosEngine>, Arc<EventCounter>) {
    let events = Arc::new(EventCounter::new());
    let toggles = ToggleEvaluator::with_default_mapper(Arc::new(InMemoryToggles::new()));
    let engine = ChaosEngine::new(SharedConfig::new(config), toggles, registry, events.clone());
    (Arc::new(engine), events)
}
