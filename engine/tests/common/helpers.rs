//! Test helpers and builder patterns for engine tests

use std::sync::Arc;

use chaos_engine::*;
use shared::ChaosConfiguration;

use super::fixtures::TestFixtures;

/// Engine plus the collaborators a test inspects afterwards
pub struct TestEngine {
    pub engine: Arc<ChaosEngine>,
    pub events: Arc<EventCounter>,
    pub toggles: Arc<InMemoryToggles>,
    pub gauge: Arc<BudgetMemoryGauge>,
}

/// Builder for engines wired with the standard assaults and test doubles
pub struct EngineBuilder {
    config: ChaosConfiguration,
    terminator: MockProcessTerminator,
}

impl EngineBuilder {
    pub fn new(config: ChaosConfiguration) -> Self {
        let mut terminator = MockProcessTerminator::new();
        terminator.expect_terminate().never();
        Self { config, terminator }
    }

    /// Expect exactly one termination with `exit_code`
    pub fn expect_kill(mut self, exit_code: i32) -> Self {
        let mut terminator = MockProcessTerminator::new();
        terminator
            .expect_terminate()
            .with(mockall::predicate::eq(exit_code))
            .times(1)
            .return_const(());
        self.terminator = terminator;
        self
    }

    pub fn build(self) -> TestEngine {
        let config = SharedConfig::try_new(self.config).unwrap();
        let events = Arc::new(EventCounter::new());
        let toggles = Arc::new(InMemoryToggles::new());
        let gauge = Arc::new(BudgetMemoryGauge::new(TestFixtures::MEMORY_BUDGET_BYTES));

        let registry = standard_registry(
            config.clone(),
            gauge.clone(),
            Arc::new(self.terminator),
            events.clone(),
        );
        let engine = ChaosEngine::new(
            config,
            ToggleEvaluator::with_default_mapper(toggles.clone()),
            registry,
            events.clone(),
        );

        TestEngine {
            engine: Arc::new(engine),
            events,
            toggles,
            gauge,
        }
    }
}
