//! Registry of available assaults and randomized selection

use std::sync::Arc;

use rand::seq::SliceRandom;
use shared::{AssaultKind, ChaosConfiguration};

use crate::traits::ChaosAssault;
use crate::types::Capability;

/// Holds every assault implementation the engine may fire
#[derive(Clone, Default)]
pub struct AssaultRegistry {
    assaults: Vec<Arc<dyn ChaosAssault>>,
}

impl AssaultRegistry {
    pub fn new() -> Self {
        Self { assaults: Vec::new() }
    }

    /// Register an assault, replacing any previous one of the same kind
    pub fn register(&mut self, assault: Arc<dyn ChaosAssault>) {
        let kind = assault.kind();
        self.assaults.retain(|existing| existing.kind() != kind);
        self.assaults.push(assault);
    }

    pub fn with(mut self, assault: Arc<dyn ChaosAssault>) -> Self {
        self.register(assault);
        self
    }

    pub fn get(&self, kind: AssaultKind) -> Option<Arc<dyn ChaosAssault>> {
        self.assaults.iter().find(|a| a.kind() == kind).cloned()
    }

    pub fn kinds(&self) -> Vec<AssaultKind> {
        self.assaults.iter().map(|a| a.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.assaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assaults.is_empty()
    }

    /// Assaults that are active and support the capability
    ///
    /// KillApp never qualifies for the request path, whatever the assault itself claims.
    pub fn candidates(
        &self,
        capability: Capability,
        config: &ChaosConfiguration,
    ) -> Vec<Arc<dyn ChaosAssault>> {
        self.assaults
            .iter()
            .filter(|assault| {
                let kind = assault.kind();
                if capability == Capability::Request && kind == AssaultKind::KillApp {
                    return false;
                }
                config.is_assault_active(kind) && assault.supports(capability, config)
            })
            .cloned()
            .collect()
    }

    /// Pick one candidate uniformly at random, `None` when nothing is active
    pub fn select_active(
        &self,
        capability: Capability,
        config: &ChaosConfiguration,
    ) -> Option<Arc<dyn ChaosAssault>> {
        let candidates = self.candidates(capability, config);
        candidates.choose(&mut rand::thread_rng()).cloned()
    }

    pub fn cancel(&self, kind: AssaultKind) {
        if let Some(assault) = self.get(kind) {
            assault.cancel();
        }
    }

    pub fn interrupt_all(&self) {
        for assault in &self.assaults {
            assault.interrupt();
        }
    }
}
