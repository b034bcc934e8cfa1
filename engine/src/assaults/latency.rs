//! Latency assault: delays the calling task

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use shared::{AssaultKind, ChaosConfiguration, LatencyParameters};
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::error::ChaosResult;
use crate::traits::ChaosAssault;
use crate::types::Capability;

pub struct LatencyAssault {
    interrupt: Arc<Notify>,
}

impl LatencyAssault {
    pub fn new() -> Self {
        Self {
            interrupt: Arc::new(Notify::new()),
        }
    }

    /// Delay drawn uniformly from the configured range
    pub fn draw_delay(params: &LatencyParameters) -> Duration {
        let millis = if params.min_ms >= params.max_ms {
            params.min_ms
        } else {
            rand::thread_rng().gen_range(params.min_ms..=params.max_ms)
        };
        Duration::from_millis(millis)
    }
}

impl Default for LatencyAssault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChaosAssault for LatencyAssault {
    fn kind(&self) -> AssaultKind {
        AssaultKind::Latency
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
        let delay = Self::draw_delay(&config.assault_parameters.latency);
        info!(delay_ms = delay.as_millis() as u64, "🐌 Chaos Monkey - latency assault");

        let interrupted = self.interrupt.notified();
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = interrupted => {
                debug!("Latency assault interrupted, returning early");
            }
        }
        Ok(())
    }

    /// A selected latency runs to completion on its call; disabling does not shorten it
    fn cancel(&self) {}

    fn interrupt(&self) {
        self.interrupt.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn config(min_ms: u64, max_ms: u64) -> ChaosConfiguration {
        let mut config = ChaosConfiguration::default();
        config.assault_parameters.latency = LatencyParameters { min_ms, max_ms };
        config
    }

    #[test]
    fn test_delay_within_range() {
        let params = LatencyParameters { min_ms: 100, max_ms: 200 };
        for _ in 0..500 {
            let delay = LatencyAssault::draw_delay(&params);
            assert!(delay >= Duration::from_millis(100) && delay <= Duration::from_millis(200));
        }
        let fixed = LatencyParameters { min_ms: 42, max_ms: 42 };
        assert_eq!(LatencyAssault::draw_delay(&fixed), Duration::from_millis(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attack_sleeps_for_drawn_delay() {
        let assault = LatencyAssault::new();
        let start = tokio::time::Instant::now();
        assault.attack(&config(300, 300)).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300) && elapsed < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_interrupt_returns_early_without_error() {
        let assault = Arc::new(LatencyAssault::new());
        let config = config(10_000, 10_000);

        let running = {
            let assault = assault.clone();
            tokio::spawn(async move { assault.attack(&config).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let start = Instant::now();
        assault.interrupt();

        let result = tokio::time::timeout(Duration::from_secs(2), running)
            .await
            .expect("latency assault should return after interrupt")
            .unwrap();
        assert!(result.is_ok());
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_capabilities() {
        let assault = LatencyAssault::new();
        let mut config = ChaosConfiguration::default();
        assert!(assault.supports(Capability::Request, &config));
        assert!(!assault.supports(Capability::Runtime, &config));
        config.runtime_request_assaults = true;
        assert!(assault.supports(Capability::Runtime, &config));
    }
}
