//! Shared configuration handle

use std::sync::Arc;
use tokio::sync::RwLock;

use shared::{ChaosConfiguration, ConfigurationUpdate};
use crate::error::ChaosResult;

/// Concurrently readable handle to the live configuration
///
/// Readers take an `Arc` snapshot and never hold the lock while they work; an update swaps
/// the whole snapshot, last writer wins.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    current: Arc<RwLock<Arc<ChaosConfiguration>>>,
}

impl SharedConfig {
    /// Wrap an already validated configuration
    pub fn new(config: ChaosConfiguration) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Validate and wrap a configuration
    pub fn try_new(config: ChaosConfiguration) -> ChaosResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> Arc<ChaosConfiguration> {
        self.current.read().await.clone()
    }

    /// Apply a partial update, returning the previous and the new snapshot
    pub async fn update(
        &self,
        delta: &ConfigurationUpdate,
    ) -> ChaosResult<(Arc<ChaosConfiguration>, Arc<ChaosConfiguration>)> {
        let mut current = self.current.write().await;
        let next = Arc::new(delta.apply(&current)?);
        let previous = std::mem::replace(&mut *current, next.clone());
        Ok((previous, next))
    }

    /// Replace the whole configuration
    pub async fn replace(&self, config: ChaosConfiguration) -> ChaosResult<Arc<ChaosConfiguration>> {
        config.validate()?;
        let mut current = self.current.write().await;
        Ok(std::mem::replace(&mut *current, Arc::new(config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_survives_update() {
        let shared = SharedConfig::new(ChaosConfiguration::default());
        let before = shared.snapshot().await;

        let (previous, next) = shared
            .update(&ConfigurationUpdate {
                enabled: Some(true),
                level: Some(7),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!before.enabled);
        assert_eq!(previous.level, 1);
        assert_eq!(next.level, 7);
        assert_eq!(shared.snapshot().await.level, 7);
    }

    #[tokio::test]
    async fn test_rejected_update_keeps_current() {
        let shared = SharedConfig::new(ChaosConfiguration::default());
        let result = shared
            .update(&ConfigurationUpdate {
                level: Some(0),
                ..Default::default()
            })
            .await;

        assert!(result.is_err());
        assert_eq!(shared.snapshot().await.level, 1);
    }

    #[tokio::test]
    async fn test_try_new_validates() {
        let mut config = ChaosConfiguration::default();
        config.level = 0;
        assert!(SharedConfig::try_new(config).is_err());
    }
}
