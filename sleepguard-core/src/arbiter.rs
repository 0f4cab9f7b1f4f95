//! Wake Arbiter
//!
//! Runs once per wake, start to finish, then suspends:
//!
//! ```text
//!   restore ──► dispatch ──► decide ──► commit ──► arm + suspend
//!      │                                              ▲
//!      └─(missing/corrupt)─► bootstrap ───────────────┘ (via dispatch)
//! ```
//!
//! 1. **Restore** the persisted schedule. A missing or corrupt store is a
//!    first power-on: wipe, generate a timeline and identity, seed, and run
//!    one arbitration so the pending kind is defined.
//! 2. **Dispatch** the report the previous wake decided on. A transport
//!    failure is logged and the cycle carries on.
//! 3. **Decide** which obligation comes next. The event at the cursor wins
//!    if it is due no later than the battery deadline.
//! 4. **Commit** the decision: pending kind, then either the cursor or the
//!    battery deadline. The deadline advances from its previous value, not
//!    from the wake time, so wake jitter never accumulates.
//! 5. **Arm** the wake timer for the winner and suspend. A deadline already
//!    in the past sleeps for zero.
//!
//! The arbiter keeps no state between cycles; everything flows through the
//! store. On hardware `suspend` never returns, and the next wake builds a
//! fresh arbiter.

use fugit::MillisDurationU64;
use rand_core::RngCore;

use crate::config::ScheduleConfig;
use crate::errors::{SchedulerResult, StorageError, StorageResult};
use crate::report::{DeviceIdentity, PendingReportKind, Report};
use crate::store::{KeyValueStore, ScheduleSnapshot, ScheduleStore};
use crate::time::{millis_to_secs, Timestamp};
use crate::timeline;
use crate::traits::{Clock, ReportTransport, SleepTimer};

/// Outcome of one arbitration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeDecision {
    /// Report to send at the next wake
    pub kind: PendingReportKind,
    /// Signed time until the winner's deadline; negative when overdue
    pub remaining_ms: i64,
    /// Timer duration, `remaining_ms` clamped at zero
    pub sleep: MillisDurationU64,
}

impl WakeDecision {
    /// Whether the winning deadline had already passed
    pub const fn was_late(&self) -> bool {
        self.remaining_ms < 0
    }
}

/// Pick the next obligation from a snapshot
///
/// Pure: reads nothing but its arguments and writes nothing.
pub fn arbitrate(snapshot: &ScheduleSnapshot, now: Timestamp) -> WakeDecision {
    let until_battery = now.millis_until(snapshot.battery_deadline);
    let until_event = snapshot.next_event().map(|event| now.millis_until(event));

    let (kind, remaining_ms) = match until_event {
        Some(until_event) if until_event <= until_battery => {
            (PendingReportKind::Event, until_event)
        }
        _ => (PendingReportKind::Battery, until_battery),
    };

    WakeDecision {
        kind,
        remaining_ms,
        sleep: MillisDurationU64::millis(remaining_ms.max(0) as u64),
    }
}

/// What happened during one wake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Store was (re)seeded during this wake
    pub first_boot: bool,
    /// Kind of the report handed to the transport
    pub dispatched: PendingReportKind,
    /// Transport accepted the report
    pub dispatch_ok: bool,
    /// Decision governing the next wake
    pub decision: WakeDecision,
}

/// Drives one wake cycle over injected collaborators
pub struct WakeArbiter<K, T, Z, C, R>
where
    T: ReportTransport,
{
    config: ScheduleConfig,
    store: ScheduleStore<K>,
    transport: T,
    destination: T::Destination,
    timer: Z,
    clock: C,
    rng: R,
}

impl<K, T, Z, C, R> WakeArbiter<K, T, Z, C, R>
where
    K: KeyValueStore,
    T: ReportTransport,
    Z: SleepTimer,
    C: Clock,
    R: RngCore,
{
    /// Assemble an arbiter for this wake
    pub fn new(
        config: ScheduleConfig,
        backend: K,
        transport: T,
        destination: T::Destination,
        timer: Z,
        clock: C,
        rng: R,
    ) -> Self {
        Self {
            config,
            store: ScheduleStore::new(backend),
            transport,
            destination,
            timer,
            clock,
            rng,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Persistent schedule
    pub fn store(&self) -> &ScheduleStore<K> {
        &self.store
    }

    /// Persistent schedule, mutable
    pub fn store_mut(&mut self) -> &mut ScheduleStore<K> {
        &mut self.store
    }

    /// Report transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Report transport, mutable
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Wake timer
    pub fn timer(&self) -> &Z {
        &self.timer
    }

    /// Wake timer, mutable
    pub fn timer_mut(&mut self) -> &mut Z {
        &mut self.timer
    }

    /// Hand the storage backend back, as a power cycle would
    pub fn release(self) -> K {
        self.store.into_inner()
    }

    /// Run one full wake: restore, dispatch, decide, commit, suspend
    ///
    /// The wake timer is armed and `suspend` called on every path. When the
    /// store cannot be restored or re-seeded the timer falls back to one
    /// battery period and the error is returned after suspend.
    pub fn run_cycle(&mut self) -> SchedulerResult<CycleOutcome> {
        let (snapshot, first_boot) = match self.restore() {
            Some(snapshot) => (snapshot, false),
            None => match self.bootstrap() {
                Ok(snapshot) => (snapshot, true),
                Err(err) => {
                    log_error!("cannot seed schedule: {}", err);
                    self.sleep_fallback();
                    return Err(err);
                }
            },
        };

        let dispatch_ok = self.dispatch(&snapshot);

        let now = self.clock.now();
        let decision = arbitrate(&snapshot, now);
        log_debug!(
            "event in {:?} ms, battery in {} ms",
            snapshot.next_event().map(|event| now.millis_until(event)),
            now.millis_until(snapshot.battery_deadline)
        );

        if let Err(err) = self.commit(&snapshot, &decision) {
            log_error!("cannot persist decision: {}", err);
            self.sleep_fallback();
            return Err(err.into());
        }

        if decision.was_late() {
            log_warn!(
                "{} deadline passed {} ms ago, waking immediately",
                decision.kind,
                -decision.remaining_ms
            );
        }
        log_info!(
            "next: {} report in {} s ({} of {} events left)",
            decision.kind,
            millis_to_secs(decision.remaining_ms.max(0)),
            snapshot.events_remaining(),
            snapshot.timeline.len()
        );

        self.timer.arm_wake_timer(decision.sleep);
        self.timer.suspend();

        Ok(CycleOutcome {
            first_boot,
            dispatched: snapshot.pending,
            dispatch_ok,
            decision,
        })
    }

    /// Read a complete schedule matching the configuration
    fn restore(&self) -> Option<ScheduleSnapshot> {
        match self.store.snapshot() {
            Ok(snapshot) if snapshot.timeline.len() == self.config.event_count => Some(snapshot),
            Ok(snapshot) => {
                log_warn!(
                    "stored timeline has {} events, configured {}; starting fresh experiment",
                    snapshot.timeline.len(),
                    self.config.event_count
                );
                None
            }
            Err(StorageError::Missing { key }) => {
                log_info!("no schedule stored ({} missing), first power-on", key);
                None
            }
            Err(err) => {
                log_warn!("stored schedule unusable ({}), starting fresh experiment", err);
                None
            }
        }
    }

    /// First power-on: seed a new experiment and decide the first report
    fn bootstrap(&mut self) -> SchedulerResult<ScheduleSnapshot> {
        let now = self.clock.now();
        let start = now.truncate_to_secs();

        let events = timeline::generate(start, &self.config, &mut self.rng)?;
        let identity = DeviceIdentity::generate(&mut self.rng);

        self.store.reset()?;
        self.store.seed_if_absent(&events, &identity, start)?;

        log_info!(
            "device {} seeded {} events over {} s starting at {}",
            identity,
            events.len(),
            self.config.experiment_duration_secs,
            start
        );
        events.log_summary(start);

        let seeded = self.store.snapshot()?;
        let first = arbitrate(&seeded, now);
        self.commit(&seeded, &first)?;

        Ok(self.store.snapshot()?)
    }

    /// Send the report decided at the previous wake
    fn dispatch(&mut self, snapshot: &ScheduleSnapshot) -> bool {
        let report = Report::new(snapshot.pending, snapshot.identity, self.clock.now());

        match self.transport.send_report(&report, &self.destination) {
            Ok(()) => {
                log_debug!("{} report sent at {}", report.kind, report.sent_at);
                true
            }
            Err(err) => {
                log_warn!("{} report not delivered: {:?}", report.kind, err);
                false
            }
        }
    }

    /// Persist a decision against the snapshot it was made from
    fn commit(&mut self, snapshot: &ScheduleSnapshot, decision: &WakeDecision) -> StorageResult<()> {
        self.store.set_pending_kind(decision.kind)?;

        match decision.kind {
            PendingReportKind::Event => {
                self.store.advance_cursor()?;
            }
            PendingReportKind::Battery => {
                let next = snapshot
                    .battery_deadline
                    .saturating_add(self.config.battery_period());
                self.store.set_battery_deadline(next)?;
            }
        }

        Ok(())
    }

    fn sleep_fallback(&mut self) {
        self.timer
            .arm_wake_timer(MillisDurationU64::secs(self.config.battery_period_secs));
        self.timer.suspend();
    }
}
