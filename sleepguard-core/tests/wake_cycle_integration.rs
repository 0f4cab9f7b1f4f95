//! Integration tests for the wake cycle
//!
//! Runs whole experiments on a simulated node and checks what the gateway
//! would see:
//! - Every event delivered once, in order, on its scheduled instant
//! - Battery reports on a fixed grid regardless of wake jitter
//! - Recovery from missing, corrupt and mismatched stores
//! - Transport failures and late wakes never stall the schedule

#![cfg(test)]

mod common;

use rand::{rngs::StdRng, SeedableRng};
use sleepguard_core::{
    store::{MemoryStore, KEY_IDENTITY, KEY_PENDING},
    Clock, DeviceIdentity, EventTimeline, KeyValueStore, PendingReportKind, ScheduleConfig,
    ScheduleCursor, ScheduleStore, SchedulerError, StorageError, Timestamp,
};

use common::{
    assert_min_spacing,
    harness::{FixedDraw, SimulatedNode},
    offset_secs,
    scenarios::Scenarios,
    sent_times,
};

use PendingReportKind::{Battery, Event};

fn seeded_store(
    events_secs: &[u64],
    cursor: u8,
    battery_secs: u64,
    pending: PendingReportKind,
) -> MemoryStore {
    let events: Vec<Timestamp> = events_secs.iter().copied().map(Timestamp::from_secs).collect();
    let timeline = EventTimeline::try_from_timestamps(&events).unwrap();
    let identity = DeviceIdentity::from_bytes([0xA5; DeviceIdentity::LEN]);

    let mut store = ScheduleStore::new(MemoryStore::new());
    store
        .seed_if_absent(&timeline, &identity, Timestamp::from_secs(battery_secs))
        .unwrap();
    for _ in 0..cursor {
        store.advance_cursor().unwrap();
    }
    store.set_pending_kind(pending).unwrap();
    store.into_inner()
}

#[test]
fn test_single_event_experiment() {
    let scenario = Scenarios::water_leak();

    for seed in 0..5 {
        let mut node =
            SimulatedNode::new(scenario.config, scenario.power_on, StdRng::seed_from_u64(seed));
        node.run_until(scenario.end()).unwrap();

        let timeline = node.store().timeline().unwrap();
        assert_eq!(timeline.len(), 1);
        let event = timeline.as_slice()[0];
        assert!((15..10_800).contains(&offset_secs(scenario.start(), event)));

        let delivered = node.delivered();
        assert_eq!(sent_times(&delivered, Event), vec![event]);
        assert_eq!(node.store().cursor().unwrap(), ScheduleCursor::new(1));

        let wakes = node.wakes();
        let event_win = wakes
            .iter()
            .position(|w| w.outcome.decision.kind == Event)
            .expect("event decided once");
        assert!(wakes[event_win + 1..]
            .iter()
            .all(|w| w.outcome.decision.kind == Battery));
    }
}

#[test]
fn test_first_wake_sends_battery_report() {
    let scenario = Scenarios::water_leak();
    // Zero draw puts the event in the first slot, 15 s after start
    let mut node = SimulatedNode::new(scenario.config, scenario.power_on, FixedDraw(0));

    let first = node.wake().unwrap();
    assert!(first.first_boot);
    assert_eq!(first.dispatched, Battery);
    assert_eq!(first.decision.kind, Event);
    assert_eq!(first.decision.remaining_ms, 14_750);

    let second = node.wake().unwrap();
    assert!(!second.first_boot);
    assert_eq!(second.dispatched, Event);
    assert_eq!(second.decision.kind, Battery);
    assert_eq!(second.decision.remaining_ms, 15_000);

    let delivered = node.delivered();
    assert_eq!(delivered[0].sent_at, scenario.power_on);
    assert_eq!(delivered[1].sent_at, scenario.at(15));
    assert_eq!(delivered[0].identity, delivered[1].identity);
}

#[test]
fn test_every_role_delivers_events_in_order() {
    for scenario in Scenarios::roles() {
        let mut node =
            SimulatedNode::new(scenario.config, scenario.power_on, StdRng::seed_from_u64(42));
        node.run_until(scenario.end().checked_add_secs(60).unwrap()).unwrap();

        let timeline = node.store().timeline().unwrap();
        let delivered = node.delivered();

        assert_eq!(
            sent_times(&delivered, Event),
            timeline.as_slice().to_vec(),
            "{}: events out of order or missing",
            scenario.name
        );

        let batteries = sent_times(&delivered, Battery);
        assert_eq!(batteries[0], scenario.power_on);
        for (k, sent) in batteries.iter().enumerate().skip(1) {
            assert_eq!(
                *sent,
                scenario.at(30 * k as u64),
                "{}: battery report {} off grid",
                scenario.name,
                k
            );
        }

        // The power-on report precedes the grid
        assert_min_spacing(&delivered[1..], 15);
    }
}

#[test]
fn test_battery_grid_is_drift_free_under_jitter() {
    let scenario = Scenarios::short();
    let mut node = SimulatedNode::new(scenario.config, scenario.power_on, FixedDraw(2));
    node.set_wake_lateness(700);

    node.run_until(scenario.end()).unwrap();

    let delivered = node.delivered();
    let batteries = sent_times(&delivered, Battery);
    assert!(batteries.len() > 15);
    for (k, sent) in batteries.iter().enumerate().skip(1) {
        let on_grid = scenario.at(30 * k as u64);
        assert_eq!(sent.as_millis(), on_grid.as_millis() + 700);
    }

    let expected_events: Vec<Timestamp> = [75, 225, 375, 525]
        .iter()
        .map(|&secs| Timestamp::from_millis(scenario.at(secs).as_millis() + 700))
        .collect();
    assert_eq!(sent_times(&delivered, Event), expected_events);

    let deadline = node.store().battery_deadline().unwrap();
    assert_eq!(offset_secs(scenario.start(), deadline) % 30, 0);
    assert!(node.armed_millis().iter().all(|&ms| ms <= 30_000));
}

#[test]
fn test_late_wake_is_clamped() {
    let scenario = Scenarios::water_leak();
    let mut node = SimulatedNode::new(scenario.config, scenario.power_on, FixedDraw(200));

    // Oversleep the first deadline by 35 s
    node.set_wake_lateness(35_000);
    node.wake().unwrap();
    node.set_wake_lateness(0);

    let late = node.wake().unwrap();
    assert_eq!(late.decision.kind, Battery);
    assert!(late.decision.was_late());
    assert_eq!(late.decision.remaining_ms, -5_000);
    assert_eq!(late.decision.sleep.ticks(), 0);

    // Zero sleep: the overdue report goes out right away, then back on grid
    let next = node.wake().unwrap();
    assert_eq!(next.dispatched, Battery);
    assert_eq!(next.decision.remaining_ms, 25_000);
    assert_eq!(node.store().battery_deadline().unwrap(), scenario.at(120));
}

#[test]
fn test_tie_goes_to_event() {
    let t = 50_000;
    let store = seeded_store(&[t - 100, t - 50, t + 50, t + 500], 2, t + 50, Battery);
    let config = ScheduleConfig::default().with_event_count(4);

    let mut node = SimulatedNode::with_store(config, Timestamp::from_secs(t), store, FixedDraw(0));
    let outcome = node.wake().unwrap();

    assert!(!outcome.first_boot);
    assert_eq!(outcome.dispatched, Battery);
    assert_eq!(outcome.decision.kind, Event);
    assert_eq!(outcome.decision.remaining_ms, 50_000);
    assert_eq!(node.armed_millis(), vec![50_000]);
    assert_eq!(node.store().cursor().unwrap(), ScheduleCursor::new(3));
    assert_eq!(node.store().battery_deadline().unwrap(), Timestamp::from_secs(t + 50));
}

#[test]
fn test_exhausted_timeline_only_battery() {
    let t = 5_000;
    let store = seeded_store(&[100, 200, 300], 3, t + 200, Event);
    let config = ScheduleConfig::default().with_event_count(3);

    let mut node = SimulatedNode::with_store(config, Timestamp::from_secs(t), store, FixedDraw(0));
    let outcome = node.wake().unwrap();

    assert_eq!(outcome.dispatched, Event);
    assert_eq!(outcome.decision.kind, Battery);
    assert_eq!(outcome.decision.sleep.ticks(), 200_000);
    assert_eq!(node.store().battery_deadline().unwrap(), Timestamp::from_secs(t + 230));
    assert_eq!(node.store().cursor().unwrap(), ScheduleCursor::new(3));

    for _ in 0..5 {
        assert_eq!(node.wake().unwrap().decision.kind, Battery);
    }
}

#[test]
fn test_transport_failure_does_not_block_schedule() {
    let scenario = Scenarios::short();
    let mut flaky = SimulatedNode::new(scenario.config, scenario.power_on, FixedDraw(2));
    let mut steady = SimulatedNode::new(scenario.config, scenario.power_on, FixedDraw(2));

    flaky.wake().unwrap();
    steady.wake().unwrap();

    flaky.drop_next_reports(1);
    let dropped = flaky.wake().unwrap();
    assert!(!dropped.dispatch_ok);

    steady.wake().unwrap();
    for _ in 0..3 {
        assert!(flaky.wake().unwrap().dispatch_ok);
        steady.wake().unwrap();
    }

    // Same schedule progress, one report fewer, nothing retried
    assert_eq!(flaky.store().snapshot().unwrap(), steady.store().snapshot().unwrap());
    assert_eq!(flaky.clock().now(), steady.clock().now());
    assert_eq!(flaky.delivered().len(), steady.delivered().len() - 1);
}

#[test]
fn test_corrupt_store_starts_fresh_experiment() {
    let scenario = Scenarios::short();
    let mut node = SimulatedNode::new(scenario.config, scenario.power_on, FixedDraw(2));
    for _ in 0..4 {
        node.wake().unwrap();
    }

    node.store_mut().backend_mut().write_u8(KEY_PENDING, 9).unwrap();
    let outcome = node.wake().unwrap();

    assert!(outcome.first_boot);
    assert_eq!(outcome.dispatched, Battery);

    // New experiment anchored at the reseed wake
    let reseed_start = node.wakes().last().unwrap().woke_at.truncate_to_secs();
    let timeline = node.store().timeline().unwrap();
    assert_eq!(timeline.len(), scenario.config.event_count);
    assert_eq!(offset_secs(reseed_start, timeline.as_slice()[0]), 75);
}

#[test]
fn test_partial_store_starts_fresh_experiment() {
    let scenario = Scenarios::short();
    let mut node = SimulatedNode::new(scenario.config, scenario.power_on, FixedDraw(1));
    node.wake().unwrap();

    assert!(node.store_mut().backend_mut().remove(KEY_IDENTITY));
    assert!(node.wake().unwrap().first_boot);
    assert!(node.store().identity().is_ok());
}

#[test]
fn test_power_cycle_resumes_schedule() {
    let scenario = Scenarios::front_door();
    let mut node =
        SimulatedNode::new(scenario.config, scenario.power_on, StdRng::seed_from_u64(7));
    for _ in 0..20 {
        node.wake().unwrap();
    }
    let before = node.store().snapshot().unwrap();

    node.power_cycle(scenario.config, StdRng::seed_from_u64(999));
    let outcome = node.wake().unwrap();

    assert!(!outcome.first_boot);
    let after = node.store().snapshot().unwrap();
    assert_eq!(after.timeline, before.timeline);
    assert_eq!(after.identity, before.identity);
    assert_eq!(outcome.dispatched, before.pending);
}

#[test]
fn test_role_change_reseeds() {
    let scenario = Scenarios::front_door();
    let mut node =
        SimulatedNode::new(scenario.config, scenario.power_on, StdRng::seed_from_u64(3));
    node.wake().unwrap();
    node.wake().unwrap();

    let leak = Scenarios::water_leak();
    node.power_cycle(leak.config, StdRng::seed_from_u64(4));
    let outcome = node.wake().unwrap();

    assert!(outcome.first_boot);
    assert_eq!(node.store().timeline().unwrap().len(), 1);
}

#[test]
fn test_unwritable_store_still_suspends() {
    let scenario = Scenarios::water_leak();
    let mut store = MemoryStore::new();
    store.set_read_only(true);

    let mut node = SimulatedNode::with_store(scenario.config, scenario.power_on, store, FixedDraw(0));
    let result = node.wake();

    assert!(matches!(
        result,
        Err(SchedulerError::Storage(StorageError::Backend { .. }))
    ));
    assert_eq!(node.armed_millis(), vec![30_000]);
    assert_eq!(
        node.clock().now().as_millis(),
        scenario.power_on.as_millis() + 30_000
    );
    assert!(node.delivered().is_empty());
}

#[test]
fn test_invalid_config_reported_without_touching_store() {
    let config = ScheduleConfig::default()
        .with_event_count(36)
        .with_experiment_duration_secs(600);
    let mut node = SimulatedNode::new(config, Timestamp::from_secs(100), FixedDraw(0));

    assert!(matches!(node.wake(), Err(SchedulerError::Config(_))));
    assert!(!node.store().is_seeded().unwrap());
    assert!(node.store().backend().is_empty());
}
