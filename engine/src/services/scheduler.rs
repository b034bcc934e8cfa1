//! Periodic runtime assault scheduler

use std::sync::Arc;

use shared::ScheduleSpec;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::engine_impl::ChaosEngine;
use crate::error::{ChaosError, ChaosResult};

struct RunningSchedule {
    spec: ScheduleSpec,
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns the timer that drives `ChaosEngine::run_scheduled_assault`
///
/// The running loop never re-reads its cadence; `reload` restarts it.
pub struct ChaosScheduler {
    engine: Arc<ChaosEngine>,
    running: Mutex<Option<RunningSchedule>>,
}

impl ChaosScheduler {
    pub fn new(engine: Arc<ChaosEngine>) -> Self {
        Self {
            engine,
            running: Mutex::new(None),
        }
    }

    /// Start with the schedule of the current configuration
    pub async fn start(&self) -> ChaosResult<()> {
        let spec = self.engine.config().snapshot().await.schedule;
        self.start_with(spec).await
    }

    /// Start with an explicit schedule; `OFF` leaves the scheduler idle
    pub async fn start_with(&self, spec: ScheduleSpec) -> ChaosResult<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(ChaosError::SchedulerError {
                message: "scheduler already running".to_string(),
            });
        }

        let Some(period) = spec.period() else {
            info!("⏸️ Chaos schedule is OFF, no runtime assaults will fire");
            return Ok(());
        };

        let (stop, stop_rx) = watch::channel(false);
        let engine = self.engine.clone();
        let handle = tokio::spawn(Self::run(engine, period, stop_rx));

        info!(schedule = %spec, "⏰ Chaos scheduler started");
        *running = Some(RunningSchedule { spec, stop, handle });
        Ok(())
    }

    /// Stop the periodic task, waiting for it to exit
    pub async fn stop(&self) -> ChaosResult<()> {
        let Some(schedule) = self.running.lock().await.take() else {
            return Ok(());
        };

        let _ = schedule.stop.send(true);
        schedule.handle.await?;
        info!(schedule = %schedule.spec, "⏹️ Chaos scheduler stopped");
        Ok(())
    }

    /// Restart with a new cadence
    pub async fn reload(&self, spec: ScheduleSpec) -> ChaosResult<()> {
        self.stop().await?;
        self.start_with(spec).await
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Cadence of the running loop, `None` when idle
    pub async fn current_schedule(&self) -> Option<ScheduleSpec> {
        self.running.lock().await.as_ref().map(|schedule| schedule.spec)
    }

    async fn run(engine: Arc<ChaosEngine>, period: std::time::Duration, mut stop: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        result = engine.run_scheduled_assault() => match result {
                            Ok(Some(kind)) => debug!(assault = %kind, "Scheduled assault done"),
                            Ok(None) => {}
                            Err(e) if e.is_injected() => info!("💥 Scheduled assault raised {}", e),
                            Err(e) => error!("❌ Scheduled assault failed: {}", e),
                        },
                        _ = stop.changed() => break,
                    }
                }
                changed = stop.changed() => {
                    if changed.is_err() {
                        warn!("Scheduler handle dropped, stopping");
                    }
                    break;
                }
            }
        }
    }
}
