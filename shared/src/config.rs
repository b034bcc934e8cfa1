//! Chaos configuration model
//!
//! A `ChaosConfiguration` is an immutable snapshot read by every decision. Runtime changes
//! arrive as a `ConfigurationUpdate`, which is applied to the current snapshot and validated
//! before the result replaces it.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{SharedError, SharedResult};
use crate::types::{AssaultKind, InjectedErrorKind, ScheduleSpec, TargetKind};

/// Default prefix for feature toggle names
pub const DEFAULT_TOGGLE_PREFIX: &str = "chaos.monkey";

/// Root configuration snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosConfiguration {
    /// Master kill switch
    pub enabled: bool,
    /// Inverse probability: a watched call fires with probability `1/level`
    pub level: u32,
    /// Fire on every `level`-th call instead of drawing randomly
    pub deterministic: bool,

    pub watched_targets: HashSet<TargetKind>,
    /// Watch signatures matching `custom_services` regardless of their target kind
    pub watch_custom_services: bool,
    /// Signature prefixes of individually watched services
    pub custom_services: Vec<String>,
    /// Signatures containing any of these fragments are never watched
    pub excludes: Vec<String>,

    pub toggles_enabled: bool,
    pub toggle_prefix: String,

    pub active_assaults: HashSet<AssaultKind>,
    /// Let the scheduler pick latency and exception assaults too
    pub runtime_request_assaults: bool,
    /// Cadence of the runtime scheduler, read once when the scheduler starts
    pub schedule: ScheduleSpec,

    pub assault_parameters: AssaultParameters,
}

/// Per-assault parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssaultParameters {
    pub latency: LatencyParameters,
    pub exception: ExceptionSpec,
    pub kill_app: KillAppParameters,
    pub memory: MemoryParameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyParameters {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for LatencyParameters {
    fn default() -> Self {
        Self {
            min_ms: 1000,
            max_ms: 3000,
        }
    }
}

/// Error raised by the exception assault
///
/// `kind` is a closed enum, so an unknown kind fails when the configuration is loaded or
/// updated rather than when the assault fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExceptionSpec {
    pub kind: InjectedErrorKind,
    pub message: String,
}

impl Default for ExceptionSpec {
    fn default() -> Self {
        Self {
            kind: InjectedErrorKind::Runtime,
            message: "Chaos Monkey - RuntimeException".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KillAppParameters {
    pub exit_code: i32,
}

impl Default for KillAppParameters {
    fn default() -> Self {
        Self { exit_code: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryParameters {
    /// Size of each allocation as a fraction of capacity
    pub fill_increment_fraction: f64,
    /// Stop filling once usage reaches this fraction of capacity
    pub fill_target_fraction: f64,
    pub millis_wait_next_increase: u64,
    pub millis_hold_filled: u64,
    /// Cancellation polling granularity while holding
    pub millis_hold_poll: u64,
}

impl MemoryParameters {
    pub fn wait_next_increase(&self) -> Duration {
        Duration::from_millis(self.millis_wait_next_increase)
    }

    pub fn hold_filled(&self) -> Duration {
        Duration::from_millis(self.millis_hold_filled)
    }

    pub fn hold_poll(&self) -> Duration {
        Duration::from_millis(self.millis_hold_poll)
    }
}

impl Default for MemoryParameters {
    fn default() -> Self {
        Self {
            fill_increment_fraction: 0.15,
            fill_target_fraction: 0.25,
            millis_wait_next_increase: 1000,
            millis_hold_filled: 90_000,
            millis_hold_poll: 500,
        }
    }
}

impl Default for ChaosConfiguration {
    fn default() -> Self {
        Self {
            enabled: false,
            level: 1,
            deterministic: false,
            watched_targets: HashSet::from([TargetKind::Service]),
            watch_custom_services: false,
            custom_services: Vec::new(),
            excludes: Vec::new(),
            toggles_enabled: false,
            toggle_prefix: DEFAULT_TOGGLE_PREFIX.to_string(),
            active_assaults: HashSet::from([AssaultKind::Latency]),
            runtime_request_assaults: false,
            schedule: ScheduleSpec::Off,
            assault_parameters: AssaultParameters::default(),
        }
    }
}

impl ChaosConfiguration {
    /// Load a configuration from a JSON file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> SharedResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| SharedError::ConfigFile {
            message: format!("{}: {e}", path.display()),
        })?;
        let config: ChaosConfiguration = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Layer `CHAOS_MONKEY_*` environment variables over this configuration
    pub fn with_env_overrides(mut self) -> SharedResult<Self> {
        if let Ok(value) = std::env::var("CHAOS_MONKEY_ENABLED") {
            self.enabled = parse_bool("CHAOS_MONKEY_ENABLED", &value)?;
        }
        if let Ok(value) = std::env::var("CHAOS_MONKEY_LEVEL") {
            self.level = value
                .trim()
                .parse()
                .map_err(|_| SharedError::invalid("CHAOS_MONKEY_LEVEL", &value))?;
        }
        if let Ok(value) = std::env::var("CHAOS_MONKEY_WATCHED_TARGETS") {
            self.watched_targets = parse_list(&value)
                .map_err(|_| SharedError::invalid("CHAOS_MONKEY_WATCHED_TARGETS", &value))?;
        }
        if let Ok(value) = std::env::var("CHAOS_MONKEY_ACTIVE_ASSAULTS") {
            self.active_assaults = parse_list(&value)
                .map_err(|_| SharedError::invalid("CHAOS_MONKEY_ACTIVE_ASSAULTS", &value))?;
        }
        if let Ok(value) = std::env::var("CHAOS_MONKEY_SCHEDULE") {
            self.schedule = value.parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check numeric ranges and cross-field constraints
    pub fn validate(&self) -> SharedResult<()> {
        if self.level < 1 {
            return Err(SharedError::invalid("level", self.level));
        }

        let latency = &self.assault_parameters.latency;
        if latency.min_ms > latency.max_ms {
            return Err(SharedError::invalid(
                "assault_parameters.latency",
                format!("{}..{}", latency.min_ms, latency.max_ms),
            ));
        }

        let memory = &self.assault_parameters.memory;
        if !valid_fraction(memory.fill_increment_fraction) {
            return Err(SharedError::invalid(
                "assault_parameters.memory.fill_increment_fraction",
                memory.fill_increment_fraction,
            ));
        }
        if !valid_fraction(memory.fill_target_fraction) {
            return Err(SharedError::invalid(
                "assault_parameters.memory.fill_target_fraction",
                memory.fill_target_fraction,
            ));
        }
        if memory.millis_hold_poll == 0
            || (memory.millis_hold_filled > 0 && memory.millis_hold_poll > memory.millis_hold_filled)
        {
            return Err(SharedError::invalid(
                "assault_parameters.memory.millis_hold_poll",
                memory.millis_hold_poll,
            ));
        }

        if self.toggles_enabled && self.toggle_prefix.trim().is_empty() {
            return Err(SharedError::invalid("toggle_prefix", "<empty>"));
        }

        Ok(())
    }

    /// Whether a call site participates in chaos at all
    pub fn watches(&self, target: TargetKind, signature: &str) -> bool {
        if self.excludes.iter().any(|fragment| signature.contains(fragment.as_str())) {
            return false;
        }
        if self.watched_targets.contains(&target) {
            return true;
        }
        self.watch_custom_services
            && self
                .custom_services
                .iter()
                .any(|prefix| signature.starts_with(prefix.as_str()))
    }

    pub fn is_assault_active(&self, kind: AssaultKind) -> bool {
        self.active_assaults.contains(&kind)
    }
}

fn valid_fraction(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}

fn parse_bool(field: &str, value: &str) -> SharedResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SharedError::invalid(field, value)),
    }
}

fn parse_list<T>(value: &str) -> Result<HashSet<T>, String>
where
    T: std::str::FromStr<Err = String> + Eq + std::hash::Hash,
{
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::parse)
        .collect()
}

/// Partial configuration change, applied on top of the current snapshot
///
/// Every field is optional; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationUpdate {
    pub enabled: Option<bool>,
    pub level: Option<u32>,
    pub deterministic: Option<bool>,
    pub watched_targets: Option<HashSet<TargetKind>>,
    pub watch_custom_services: Option<bool>,
    pub custom_services: Option<Vec<String>>,
    pub excludes: Option<Vec<String>>,
    pub toggles_enabled: Option<bool>,
    pub toggle_prefix: Option<String>,
    pub active_assaults: Option<HashSet<AssaultKind>>,
    pub runtime_request_assaults: Option<bool>,
    pub schedule: Option<ScheduleSpec>,
    pub latency: Option<LatencyParameters>,
    pub exception: Option<ExceptionSpec>,
    pub kill_app: Option<KillAppParameters>,
    pub memory: Option<MemoryParameters>,
}

impl ConfigurationUpdate {
    /// Produce a new validated snapshot; `base` is left untouched on error
    pub fn apply(&self, base: &ChaosConfiguration) -> SharedResult<ChaosConfiguration> {
        let mut next = base.clone();

        if let Some(enabled) = self.enabled {
            next.enabled = enabled;
        }
        if let Some(level) = self.level {
            next.level = level;
        }
        if let Some(deterministic) = self.deterministic {
            next.deterministic = deterministic;
        }
        if let Some(targets) = &self.watched_targets {
            next.watched_targets = targets.clone();
        }
        if let Some(watch) = self.watch_custom_services {
            next.watch_custom_services = watch;
        }
        if let Some(services) = &self.custom_services {
            next.custom_services = services.clone();
        }
        if let Some(excludes) = &self.excludes {
            next.excludes = excludes.clone();
        }
        if let Some(toggles) = self.toggles_enabled {
            next.toggles_enabled = toggles;
        }
        if let Some(prefix) = &self.toggle_prefix {
            next.toggle_prefix = prefix.clone();
        }
        if let Some(active) = &self.active_assaults {
            next.active_assaults = active.clone();
        }
        if let Some(runtime) = self.runtime_request_assaults {
            next.runtime_request_assaults = runtime;
        }
        if let Some(schedule) = self.schedule {
            next.schedule = schedule;
        }
        if let Some(latency) = self.latency {
            next.assault_parameters.latency = latency;
        }
        if let Some(exception) = &self.exception {
            next.assault_parameters.exception = exception.clone();
        }
        if let Some(kill_app) = self.kill_app {
            next.assault_parameters.kill_app = kill_app;
        }
        if let Some(memory) = self.memory {
            next.assault_parameters.memory = memory;
        }

        next.validate()?;
        Ok(next)
    }
}
