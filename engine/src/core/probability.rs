//! Level-based firing decision

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use shared::ChaosConfiguration;

/// Decides whether any assault fires for one evaluation
///
/// A level of `n` fires with probability `1/n`. In deterministic mode a shared call counter
/// fires on every `n`-th evaluation instead.
#[derive(Debug, Default)]
pub struct ProbabilitySelector {
    calls: AtomicU64,
}

impl ProbabilitySelector {
    pub fn new() -> Self {
        Self {
            calls: AtomicU64::new(0),
        }
    }

    /// Decision for the current configuration
    pub fn should_fire_for(&self, config: &ChaosConfiguration) -> bool {
        if config.deterministic {
            self.should_fire_deterministic(config.level)
        } else {
            self.should_fire(config.level)
        }
    }

    /// Random decision using the thread-local generator
    pub fn should_fire(&self, level: u32) -> bool {
        if level <= 1 {
            return true;
        }
        Self::should_fire_with(level, &mut rand::thread_rng())
    }

    /// Draw uniformly from `1..=level` and fire on `1`
    pub fn should_fire_with<R: Rng>(level: u32, rng: &mut R) -> bool {
        if level <= 1 {
            return true;
        }
        rng.gen_range(1..=level) == 1
    }

    /// Fire on every `level`-th call
    pub fn should_fire_deterministic(&self, level: u32) -> bool {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        level <= 1 || call % u64::from(level) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Generator that fails the test if it is ever consulted
    struct ForbiddenRng;

    impl rand::RngCore for ForbiddenRng {
        fn next_u32(&mut self) -> u32 {
            panic!("randomness consumed for level 1")
        }
        fn next_u64(&mut self) -> u64 {
            panic!("randomness consumed for level 1")
        }
        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            panic!("randomness consumed for level 1")
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            panic!("randomness consumed for level 1")
        }
    }

    #[test]
    fn test_level_one_always_fires_without_randomness() {
        let mut rng = ForbiddenRng;
        for _ in 0..1000 {
            assert!(ProbabilitySelector::should_fire_with(1, &mut rng));
        }

        let selector = ProbabilitySelector::new();
        assert!((0..1000).all(|_| selector.should_fire(1)));
    }

    #[test]
    fn test_fire_rate_converges_to_inverse_level() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let trials = 100_000;

        for level in [2u32, 5, 10] {
            let fired = (0..trials)
                .filter(|_| ProbabilitySelector::should_fire_with(level, &mut rng))
                .count();
            let rate = fired as f64 / trials as f64;
            let expected = 1.0 / level as f64;
            assert!(
                (rate - expected).abs() < 0.01,
                "level {level}: rate {rate} too far from {expected}"
            );
        }
    }

    #[test]
    fn test_deterministic_fires_every_nth_call() {
        let selector = ProbabilitySelector::new();
        let decisions: Vec<bool> = (0..9).map(|_| selector.should_fire_deterministic(3)).collect();
        assert_eq!(
            decisions,
            vec![false, false, true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn test_should_fire_for_respects_mode() {
        let selector = ProbabilitySelector::new();
        let mut config = ChaosConfiguration::default();
        config.deterministic = true;
        config.level = 2;

        assert!(!selector.should_fire_for(&config));
        assert!(selector.should_fire_for(&config));
    }
}
