//! In-memory toggle store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::traits::ChaosToggles;

/// Toggle store backed by a map; unprovisioned names read as `None`
#[derive(Debug, Clone, Default)]
pub struct InMemoryToggles {
    toggles: Arc<RwLock<HashMap<String, bool>>>,
}

impl InMemoryToggles {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, name: impl Into<String>, enabled: bool) {
        let name = name.into();
        debug!(toggle = %name, enabled, "Toggle set");
        self.toggles.write().await.insert(name, enabled);
    }

    pub async fn remove(&self, name: &str) -> Option<bool> {
        self.toggles.write().await.remove(name)
    }

    pub async fn clear(&self) {
        self.toggles.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.toggles.read().await.len()
    }
}

#[async_trait]
impl ChaosToggles for InMemoryToggles {
    async fn is_enabled(&self, toggle_name: &str) -> Option<bool> {
        self.toggles.read().await.get(toggle_name).copied()
    }
}
