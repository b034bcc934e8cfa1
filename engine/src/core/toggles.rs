//! Per-signature feature toggle gate

use std::sync::Arc;

use shared::ChaosConfiguration;
use tracing::debug;

use crate::traits::{ChaosToggles, ToggleNameMapper};
use crate::types::CallSignature;

/// Default naming strategy: `{prefix}.{target}.{sanitized signature}`
///
/// Characters outside `[A-Za-z0-9._-]` are replaced with `_` so the name is safe for flag
/// stores with restrictive key syntax.
#[derive(Debug, Clone, Default)]
pub struct PrefixToggleNameMapper;

impl PrefixToggleNameMapper {
    pub fn new() -> Self {
        Self
    }

    fn sanitize(signature: &str) -> String {
        signature
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl ToggleNameMapper for PrefixToggleNameMapper {
    fn map_name(&self, prefix: &str, call: &CallSignature) -> String {
        format!("{}.{}.{}", prefix, call.target, Self::sanitize(&call.signature))
    }
}

/// Maps a call signature to an "enabled" decision
///
/// Toggles are opt-in: with toggles disabled every call is active, and a toggle that was
/// never provisioned counts as active.
pub struct ToggleEvaluator {
    toggles: Arc<dyn ChaosToggles>,
    mapper: Arc<dyn ToggleNameMapper>,
}

impl ToggleEvaluator {
    pub fn new(toggles: Arc<dyn ChaosToggles>, mapper: Arc<dyn ToggleNameMapper>) -> Self {
        Self { toggles, mapper }
    }

    /// Evaluator using the default prefix naming strategy
    pub fn with_default_mapper(toggles: Arc<dyn ChaosToggles>) -> Self {
        Self::new(toggles, Arc::new(PrefixToggleNameMapper::new()))
    }

    pub async fn is_active(&self, config: &ChaosConfiguration, call: &CallSignature) -> bool {
        if !config.toggles_enabled {
            return true;
        }

        let name = self.mapper.map_name(&config.toggle_prefix, call);
        match self.toggles.is_enabled(&name).await {
            Some(enabled) => enabled,
            None => {
                debug!(toggle = %name, "Toggle not configured, treating as active");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockChaosToggles;
    use mockall::predicate::eq;
    use shared::TargetKind;

    fn call() -> CallSignature {
        CallSignature::new(TargetKind::Service, "com.example.Foo#bar(java.lang.String)")
    }

    fn toggles_on() -> ChaosConfiguration {
        ChaosConfiguration {
            toggles_enabled: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_mapper_sanitizes() {
        let name = PrefixToggleNameMapper::new().map_name("chaos.monkey", &call());
        assert_eq!(name, "chaos.monkey.service.com.example.Foo_bar_java.lang.String_");
    }

    #[tokio::test]
    async fn test_disabled_toggles_are_always_active() {
        let mut toggles = MockChaosToggles::new();
        toggles.expect_is_enabled().never();

        let evaluator = ToggleEvaluator::with_default_mapper(Arc::new(toggles));
        let config = ChaosConfiguration::default();
        assert!(evaluator.is_active(&config, &call()).await);
        assert!(evaluator.is_active(&config, &CallSignature::new(TargetKind::Controller, "")).await);
    }

    #[tokio::test]
    async fn test_explicit_false_blocks() {
        let mut toggles = MockChaosToggles::new();
        toggles
            .expect_is_enabled()
            .with(eq("chaos.monkey.service.com.example.Foo_bar_java.lang.String_"))
            .returning(|_| Some(false));

        let evaluator = ToggleEvaluator::with_default_mapper(Arc::new(toggles));
        assert!(!evaluator.is_active(&toggles_on(), &call()).await);
    }

    #[tokio::test]
    async fn test_unconfigured_toggle_fails_open() {
        let mut toggles = MockChaosToggles::new();
        toggles.expect_is_enabled().returning(|_| None);

        let evaluator = ToggleEvaluator::with_default_mapper(Arc::new(toggles));
        assert!(evaluator.is_active(&toggles_on(), &call()).await);
    }

    #[tokio::test]
    async fn test_custom_mapper_is_used() {
        let mut mapper = crate::traits::MockToggleNameMapper::new();
        mapper
            .expect_map_name()
            .returning(|prefix, call| format!("{prefix}:{}", call.signature));

        let mut toggles = MockChaosToggles::new();
        toggles
            .expect_is_enabled()
            .with(eq("ops:com.example.Foo#bar(java.lang.String)"))
            .returning(|_| Some(true));

        let evaluator = ToggleEvaluator::new(Arc::new(toggles), Arc::new(mapper));
        let config = ChaosConfiguration {
            toggles_enabled: true,
            toggle_prefix: "ops".to_string(),
            ..Default::default()
        };
        assert!(evaluator.is_active(&config, &call()).await);
    }
}
