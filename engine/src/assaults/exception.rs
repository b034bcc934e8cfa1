//! Exception assault: fails the intercepted call with the configured error

use async_trait::async_trait;
use shared::{AssaultKind, ChaosConfiguration};
use tracing::info;

use crate::error::{ChaosError, ChaosResult, InjectedFault};
use crate::traits::ChaosAssault;
use crate::types::Capability;

#[derive(Debug, Default)]
pub struct ExceptionAssault;

impl ExceptionAssault {
    pub fn new() -> Self {
        Self
    }

    /// The fault this configuration raises
    pub fn fault(config: &ChaosConfiguration) -> InjectedFault {
        let spec = &config.assault_parameters.exception;
        InjectedFault {
            kind: spec.kind,
            message: spec.message.clone(),
        }
    }
}

#[async_trait]
impl ChaosAssault for ExceptionAssault {
    fn kind(&self) -> AssaultKind {
        AssaultKind::Exception
    }

    fn supports(&self, capability: Capability, config: &ChaosConfiguration) -> bool {
        match capability {
            Capability::Request => true,
            Capability::Runtime => config.runtime_request_assaults,
        }
    }

    fn runs_in_background(&self) -> bool {
        false
    }

    async fn attack(&self, config: &ChaosConfiguration) -> ChaosResult<()> {
        let fault = Self::fault(config);
        info!(kind = %fault.kind, "💥 Chaos Monkey - exception assault");
        Err(ChaosError::Injected(fault))
    }

    fn cancel(&self) {}

    fn interrupt(&self) {}
}
