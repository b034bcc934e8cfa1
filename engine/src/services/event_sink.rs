//! Event sink implementations

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::traits::EventSink;
use crate::types::{ChaosEvent, EventOutcome};

/// Logs every event through `tracing`
#[derive(Debug, Default, Clone)]
pub struct TracingEventSink;

impl TracingEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingEventSink {
    fn publish(&self, event: ChaosEvent) {
        let target = event.target.map(|t| t.to_string()).unwrap_or_default();
        let signature = event.signature.as_deref().unwrap_or("");
        match event.outcome {
            EventOutcome::Fired(_) | EventOutcome::MemoryFilled { .. } => info!(
                event_id = %event.id,
                target_kind = %target,
                signature,
                outcome = %event.outcome.label(),
                "🐒 Chaos event"
            ),
            _ => debug!(
                event_id = %event.id,
                target_kind = %target,
                signature,
                outcome = %event.outcome.label(),
                "Chaos event"
            ),
        }
    }
}

/// Forwards events into a bounded channel, dropping them when the consumer falls behind
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: mpsc::Sender<ChaosEvent>,
    dropped: Arc<AtomicU64>,
}

impl ChannelEventSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ChaosEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            receiver,
        )
    }

    /// Events lost to a full or closed channel
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl EventSink for ChannelEventSink {
    fn publish(&self, event: ChaosEvent) {
        if self.sender.try_send(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Counts events per outcome label
#[derive(Debug, Default)]
pub struct EventCounter {
    counts: Mutex<HashMap<String, u64>>,
}

impl EventCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, label: &str) -> u64 {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(label)
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }

    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for EventCounter {
    fn publish(&self, event: ChaosEvent) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        *counts.entry(event.outcome.label()).or_insert(0) += 1;
    }
}

/// Publishes each event to every inner sink
#[derive(Default, Clone)]
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanoutEventSink {
    fn publish(&self, event: ChaosEvent) {
        for sink in &self.sinks {
            sink.publish(event.clone());
        }
    }
}
