//! Request decision engine with dependency injection

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use shared::{AssaultKind, ChaosConfiguration, ConfigurationUpdate, TargetKind};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::{AssaultRegistry, ProbabilitySelector, ToggleEvaluator};
use crate::error::ChaosResult;
use crate::state::SharedConfig;
use crate::traits::{ChaosAssault, EventSink};
use crate::types::{CallSignature, Capability, ChaosEvent, EventOutcome};

/// Decides, per intercepted call or scheduler tick, whether and how to misbehave
pub struct ChaosEngine {
    config: SharedConfig,
    toggles: ToggleEvaluator,
    probability: ProbabilitySelector,
    registry: AssaultRegistry,
    events: Arc<dyn EventSink>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl ChaosEngine {
    pub fn new(
        config: SharedConfig,
        toggles: ToggleEvaluator,
        registry: AssaultRegistry,
        events: Arc<dyn EventSink>,
    ) -> Self {
        info!(assaults = ?registry.kinds(), "🐒 Chaos Monkey - ready to do evil");

        Self {
            config,
            toggles,
            probability: ProbabilitySelector::new(),
            registry,
            events,
            background: Mutex::new(Vec::new()),
        }
    }

    /// Handle to the live configuration
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn registry(&self) -> &AssaultRegistry {
        &self.registry
    }

    /// Request-path entry point
    ///
    /// Returns the outcome of the gates. When the selected assault is the exception assault
    /// its fault is returned as `Err`; a latency assault returns only after its sleep.
    pub async fn evaluate(&self, target: TargetKind, signature: &str) -> ChaosResult<EventOutcome> {
        let config = self.config.snapshot().await;
        if !config.enabled {
            return Ok(EventOutcome::ChaosDisabled);
        }

        let call = CallSignature::new(target, signature);
        if !config.watches(target, signature) {
            return Ok(self.skip(&call, EventOutcome::SkippedNotWatched));
        }
        if !self.toggles.is_active(&config, &call).await {
            return Ok(self.skip(&call, EventOutcome::SkippedToggleOff));
        }
        if !self.probability.should_fire_for(&config) {
            return Ok(self.skip(&call, EventOutcome::SkippedProbability));
        }
        let Some(assault) = self.registry.select_active(Capability::Request, &config) else {
            return Ok(self.skip(&call, EventOutcome::NoActiveAssault));
        };

        let outcome = EventOutcome::Fired(assault.kind());
        info!(target_kind = %call.target, signature = %call.signature, assault = %assault.kind(), "🐒 Chaos Monkey firing");
        self.events.publish(ChaosEvent::for_call(&call, outcome));

        self.execute(assault, config).await?;
        Ok(outcome)
    }

    /// Scheduler callback: fire one runtime-capable assault, if any is active
    pub async fn run_scheduled_assault(&self) -> ChaosResult<Option<AssaultKind>> {
        let config = self.config.snapshot().await;
        if !config.enabled {
            debug!("Chaos disabled, skipping scheduled assault");
            return Ok(None);
        }

        let Some(assault) = self.registry.select_active(Capability::Runtime, &config) else {
            debug!("No runtime assault active");
            return Ok(None);
        };

        let kind = assault.kind();
        info!(assault = %kind, "⏰ Scheduled assault firing");
        self.events
            .publish(ChaosEvent::runtime(EventOutcome::Fired(kind)));

        self.execute(assault, config).await?;
        Ok(Some(kind))
    }

    /// Apply an admin update and wind down assaults it deactivated
    pub async fn update_configuration(
        &self,
        delta: &ConfigurationUpdate,
    ) -> ChaosResult<Arc<ChaosConfiguration>> {
        let (previous, next) = self.config.update(delta).await?;

        for kind in AssaultKind::ALL {
            if !next.enabled || !next.is_assault_active(kind) {
                self.registry.cancel(kind);
            }
        }

        info!(
            enabled = next.enabled,
            level = next.level,
            was_enabled = previous.enabled,
            assaults = ?next.active_assaults,
            "⚙️ Configuration updated"
        );
        Ok(next)
    }

    /// Number of background assaults still running
    pub fn background_tasks(&self) -> usize {
        let mut handles = self.background.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|handle| !handle.is_finished());
        handles.len()
    }

    /// Wait for every background assault to finish
    pub async fn wait_for_background(&self) -> ChaosResult<()> {
        for handle in self.take_background() {
            handle.await?;
        }
        Ok(())
    }

    /// Interrupt everything in flight and join background work within `grace`
    ///
    /// Every background task is joined or aborted; the first join failure is returned after.
    pub async fn shutdown(&self, grace: Duration) -> ChaosResult<()> {
        info!("🛑 Chaos Monkey shutting down");
        self.registry.interrupt_all();

        let deadline = tokio::time::Instant::now() + grace;
        let mut first_failure = None;
        for handle in self.take_background() {
            let abort = handle.abort_handle();
            match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("❌ Background assault ended abnormally: {}", e);
                    first_failure.get_or_insert(e);
                }
                Err(_) => {
                    warn!("⚠️ Background assault did not stop within {:?}, aborting", grace);
                    abort.abort();
                }
            }
        }

        match first_failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn skip(&self, call: &CallSignature, outcome: EventOutcome) -> EventOutcome {
        debug!(target_kind = %call.target, signature = %call.signature, outcome = %outcome.label(), "Chaos skipped");
        self.events.publish(ChaosEvent::for_call(call, outcome));
        outcome
    }

    async fn execute(
        &self,
        assault: Arc<dyn ChaosAssault>,
        config: Arc<ChaosConfiguration>,
    ) -> ChaosResult<()> {
        if !assault.runs_in_background() {
            return assault.attack(&config).await;
        }

        let handle = tokio::spawn(async move {
            if let Err(e) = assault.attack(&config).await {
                error!(assault = %assault.kind(), "❌ Background assault failed: {}", e);
            }
        });

        let mut handles = self.background.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|handle| !handle.is_finished());
        handles.push(handle);
        Ok(())
    }

    fn take_background(&self) -> Vec<JoinHandle<()>> {
        std::mem::take(&mut *self.background.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
