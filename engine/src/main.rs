//! Chaos Monkey binary entry point
//!
//! Runs the engine against a simulated host: a loop of intercepted calls across every target
//! kind plus the runtime scheduler, until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use chaos_engine::{
    standard_registry, ChaosEngine, ChaosScheduler, EventCounter, EventOutcome, EventSink,
    FanoutEventSink, Health, HealthWatcher, InMemoryToggles, OutgoingCallWatcher,
    ProcessTerminator, SharedConfig, SystemMemoryGauge, ToggleEvaluator, TracingEventSink,
    WatchedResponse,
};
use chaos_engine::assaults::ExitTerminator;
use shared::logging::{init_tracing, log_error, log_shutdown, log_startup};
use shared::{ChaosConfiguration, ConfigurationUpdate, ScheduleSpec, TargetKind};

/// Call sites the simulated host cycles through
const SIMULATED_CALLS: [(TargetKind, &str); 6] = [
    (TargetKind::Controller, "com.example.shop.CartController#view"),
    (TargetKind::RestController, "com.example.shop.api.OrderApi#place"),
    (TargetKind::Service, "com.example.shop.PricingService#quote"),
    (TargetKind::Repository, "com.example.shop.OrderRepository#save"),
    (TargetKind::RestClientCall, "GET https://inventory.internal/items"),
    (TargetKind::ActuatorHealth, "inventoryHealthIndicator"),
];

#[derive(Parser)]
#[command(name = "chaos-monkey")]
#[command(about = "Chaos Monkey fault injection engine with a simulated host")]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Attack one in `level` calls
    #[arg(long)]
    level: Option<u32>,

    /// Enable or disable chaos
    #[arg(long)]
    enabled: Option<bool>,

    /// Runtime assault cadence, e.g. "30s" or "OFF"
    #[arg(long)]
    schedule: Option<ScheduleSpec>,

    /// Base log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Delay between simulated calls
    #[arg(long, default_value_t = 250)]
    call_interval_ms: u64,

    /// Kill with SIGKILL instead of exiting
    #[arg(long)]
    kill_with_signal: bool,

    /// Memory capacity for the memory assault, defaults to system memory
    #[arg(long)]
    memory_limit_mb: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(Some(&args.log_level));

    log_startup("chaos-monkey", "Chaos Monkey simulated host");

    let config = load_configuration(&args)?;
    info!(
        enabled = config.enabled,
        level = config.level,
        schedule = %config.schedule,
        assaults = ?config.active_assaults,
        targets = ?config.watched_targets,
        "📋 Configuration loaded"
    );

    let config = SharedConfig::try_new(config)?;
    let counter = Arc::new(EventCounter::new());
    let events: Arc<dyn EventSink> = Arc::new(
        FanoutEventSink::new()
            .with(Arc::new(TracingEventSink::new()))
            .with(counter.clone()),
    );

    let gauge = match args.memory_limit_mb {
        Some(limit_mb) => SystemMemoryGauge::new().with_limit_mb(limit_mb),
        None => SystemMemoryGauge::new(),
    };
    let registry = standard_registry(config.clone(), Arc::new(gauge), terminator(args.kill_with_signal), events.clone());
    let toggles = ToggleEvaluator::with_default_mapper(Arc::new(InMemoryToggles::new()));
    let engine = Arc::new(ChaosEngine::new(config, toggles, registry, events));

    let scheduler = ChaosScheduler::new(engine.clone());
    scheduler.start().await?;

    tokio::select! {
        _ = simulate_host(engine.clone(), Duration::from_millis(args.call_interval_ms)) => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                log_error("chaos-monkey", "Listening for Ctrl-C", &e);
            }
        }
    }

    log_shutdown("chaos-monkey", "interrupted");
    scheduler.stop().await?;
    engine.shutdown(Duration::from_secs(5)).await?;

    let mut counts: Vec<_> = counter.snapshot().into_iter().collect();
    counts.sort();
    for (outcome, count) in counts {
        info!(outcome = %outcome, count, "📊 Event total");
    }
    Ok(())
}

fn load_configuration(args: &Args) -> anyhow::Result<ChaosConfiguration> {
    let base = match &args.config {
        Some(path) => ChaosConfiguration::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ChaosConfiguration::default(),
    };
    let base = base.with_env_overrides().context("applying CHAOS_MONKEY_* overrides")?;

    let overrides = ConfigurationUpdate {
        enabled: args.enabled,
        level: args.level,
        schedule: args.schedule,
        ..Default::default()
    };
    overrides.apply(&base).context("applying command line overrides")
}

fn terminator(with_signal: bool) -> Arc<dyn ProcessTerminator> {
    #[cfg(unix)]
    if with_signal {
        return Arc::new(chaos_engine::assaults::SignalTerminator);
    }
    #[cfg(not(unix))]
    if with_signal {
        warn!("⚠️ SIGKILL is not available on this platform, falling back to exit");
    }
    Arc::new(ExitTerminator)
}

async fn simulate_host(engine: Arc<ChaosEngine>, interval: Duration) {
    let outgoing = OutgoingCallWatcher::new(engine.clone());
    let health = HealthWatcher::new(engine.clone());
    let mut ticker = tokio::time::interval(interval);

    for (target, signature) in SIMULATED_CALLS.iter().cycle() {
        ticker.tick().await;

        match target {
            TargetKind::RestClientCall => {
                match outgoing.watch(signature, || async { 200u16 }).await {
                    Ok(WatchedResponse::Passed(status)) => info!(signature, status, "🌐 Outgoing call passed"),
                    Ok(WatchedResponse::Substituted(response)) => {
                        warn!(signature, status = response.status, "🌐 Outgoing call replaced")
                    }
                    Err(e) => log_error("simulated-host", "Outgoing call", &e),
                }
            }
            TargetKind::ActuatorHealth => {
                let reported = health
                    .check(signature, || async { Ok::<_, std::io::Error>(Health::Up) })
                    .await;
                if !reported.is_up() {
                    warn!(signature, health = ?reported, "🩺 Health check reported down");
                }
            }
            _ => match engine.evaluate(*target, signature).await {
                Ok(EventOutcome::Fired(kind)) => info!(signature, assault = %kind, "Call survived assault"),
                Ok(_) => {}
                Err(e) if e.is_injected() => warn!(signature, "💥 Call failed: {}", e),
                Err(e) => log_error("simulated-host", "Evaluating call", &e),
            },
        }
    }
}
