//! Tests for event sinks

use std::sync::Arc;

use shared::{AssaultKind, TargetKind};
use crate::services::event_sink::{ChannelEventSink, EventCounter, FanoutEventSink, TracingEventSink};
use crate::traits::{EventSink, MockEventSink};
use crate::types::{CallSignature, ChaosEvent, EventOutcome};

fn fired(kind: AssaultKind) -> ChaosEvent {
    let call = CallSignature::new(TargetKind::Service, "com.example.Foo#bar");
    ChaosEvent::for_call(&call, EventOutcome::Fired(kind))
}

#[test]
fn test_counter_counts_per_label() {
    let counter = EventCounter::new();
    counter.publish(fired(AssaultKind::Latency));
    counter.publish(fired(AssaultKind::Latency));
    counter.publish(ChaosEvent::runtime(EventOutcome::MemoryFilled { bytes: 10 }));

    assert_eq!(counter.count("fired.latency"), 2);
    assert_eq!(counter.count("memory.filled"), 1);
    assert_eq!(counter.count("fired.exception"), 0);
    assert_eq!(counter.total(), 3);
}

#[tokio::test]
async fn test_channel_sink_delivers_events() {
    let (sink, mut receiver) = ChannelEventSink::new(4);
    let event = fired(AssaultKind::Exception);
    sink.publish(event.clone());

    let received = receiver.recv().await.unwrap();
    assert_eq!(received, event);
    assert_eq!(sink.dropped(), 0);
}

#[test]
fn test_channel_sink_drops_when_full_without_blocking() {
    let (sink, _receiver) = ChannelEventSink::new(2);
    for _ in 0..5 {
        sink.publish(fired(AssaultKind::Latency));
    }
    assert_eq!(sink.dropped(), 3);
}

#[test]
fn test_channel_sink_survives_closed_receiver() {
    let (sink, receiver) = ChannelEventSink::new(2);
    drop(receiver);
    sink.publish(fired(AssaultKind::Latency));
    assert_eq!(sink.dropped(), 1);
}

#[test]
fn test_fanout_reaches_every_sink() {
    let mut mock = MockEventSink::new();
    mock.expect_publish()
        .withf(|event| event.outcome == EventOutcome::Fired(AssaultKind::Memory))
        .times(1)
        .return_const(());
    let counter = Arc::new(EventCounter::new());

    let fanout = FanoutEventSink::new()
        .with(Arc::new(mock))
        .with(counter.clone())
        .with(Arc::new(TracingEventSink::new()));
    assert_eq!(fanout.len(), 3);

    fanout.publish(ChaosEvent::runtime(EventOutcome::Fired(AssaultKind::Memory)));
    assert_eq!(counter.count("fired.memory"), 1);
}
