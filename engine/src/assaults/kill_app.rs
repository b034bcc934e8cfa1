//! KillApp assault: terminates the host process
//!
//! Irrecoverable. Only the scheduler may fire it; the registry keeps it off the request path.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{AssaultKind, ChaosConfiguration};
use tracing::{error, warn};

use crate::error::ChaosResult;
use crate::traits::{ChaosAssault, ProcessTerminator};
use crate::types::Capability;

/// Exits the process with the given code
#[derive(Debug, Default)]
pub struct ExitTerminator;

impl ProcessTerminator for ExitTerminator {
    fn terminate(&self, exit_code: i32) {
        warn!(exit_code, "💀 Chaos Monkey - exiting process");
        std::process::exit(exit_code);
    }
}

/// Sends SIGKILL to the current process
#[cfg(unix)]
#[derive(Debug, Default)]
pub struct SignalTerminator;

#[cfg(unix)]
impl ProcessTerminator for SignalTerminator {
    fn terminate(&self, exit_code: i32) {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        warn!("💀 Chaos Monkey - killing own process with SIGKILL");
        if let Err(e) = signal::kill(Pid::this(), Signal::SIGKILL) {
            error!("❌ Failed to signal own process: {}, falling back to exit", e);
            std::process::exit(exit_code);
        }
    }
}

pub struct KillAppAssault {
    terminator: Arc<dyn ProcessTerminator>,
}

impl KillAppAssault {
    pub fn new(terminator: Arc<dyn ProcessTerminator>) -> Self {
        Self { terminator }
    }
}

#[async_trait]
impl ChaosAssault for KillAppAssault {
    fn kind(&self) -> AssaultKind {
        AssaultKind::KillApp
    }

    fn supports(&self, capability: Capability, _config: &ChaosConfiguration) -> bool {
        capability == Capability::Runtime
    }

    fn runs_in_background(&self) -> bool {
        false
    }

    async fn attack(&self, config: &ChaosConfiguration) -> ChaosResult<()> {
        let exit_code = config.assault_parameters.kill_app.exit_code;
        warn!(exit_code, "💀 Chaos Monkey - I am killing your application!");
        self.terminator.terminate(exit_code);
        Ok(())
    }

    fn cancel(&self) {}

    fn interrupt(&self) {}
}
