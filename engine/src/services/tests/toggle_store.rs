//! Tests for the in-memory toggle store

use std::sync::Arc;

use shared::{ChaosConfiguration, TargetKind};
use crate::core::ToggleEvaluator;
use crate::services::toggle_store::InMemoryToggles;
use crate::traits::ChaosToggles;
use crate::types::CallSignature;

#[tokio::test]
async fn test_unset_toggle_is_none() {
    let toggles = InMemoryToggles::new();
    assert_eq!(toggles.is_enabled("chaos.monkey.service.x").await, None);
}

#[tokio::test]
async fn test_set_remove_clear() {
    let toggles = InMemoryToggles::new();
    toggles.set("a", false).await;
    toggles.set("b", true).await;
    assert_eq!(toggles.is_enabled("a").await, Some(false));
    assert_eq!(toggles.len().await, 2);

    assert_eq!(toggles.remove("a").await, Some(false));
    assert_eq!(toggles.is_enabled("a").await, None);

    toggles.clear().await;
    assert_eq!(toggles.len().await, 0);
}

#[tokio::test]
async fn test_explicit_false_gates_evaluator() {
    let toggles = Arc::new(InMemoryToggles::new());
    let evaluator = ToggleEvaluator::with_default_mapper(toggles.clone());
    let config = ChaosConfiguration {
        toggles_enabled: true,
        ..Default::default()
    };
    let call = CallSignature::new(TargetKind::Repository, "OrderRepository#save");

    assert!(evaluator.is_active(&config, &call).await);

    toggles.set("chaos.monkey.repository.OrderRepository_save", false).await;
    assert!(!evaluator.is_active(&config, &call).await);

    let untoggled = ChaosConfiguration::default();
    assert!(evaluator.is_active(&untoggled, &call).await);
}
