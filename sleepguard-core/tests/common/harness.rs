//! Simulated sensor node for integration testing
//!
//! Provides:
//! - A node whose RTC and deep sleep are virtual, so whole experiments run
//!   in a test
//! - Power cycles that drop everything but the store
//! - A log of every wake with the report it sent
//! - Deterministic entropy sources

use rand::{Error, RngCore};
use sleepguard_core::{
    sim::{RecordingTransport, VirtualClock, VirtualSleepTimer},
    store::MemoryStore,
    Clock, CycleOutcome, Report, ScheduleConfig, ScheduleStore, SchedulerResult, Timestamp,
    WakeArbiter,
};

/// Gateway address used by every simulated node
pub const GATEWAY: &str = "coap://[fd00::1]/report";

type Arbiter<R> = WakeArbiter<MemoryStore, RecordingTransport, VirtualSleepTimer, VirtualClock, R>;

/// Entropy source returning the same draw every time
///
/// With every segment offering the same number of slots, a constant draw
/// puts each event at a predictable slot.
#[derive(Debug, Clone, Copy)]
pub struct FixedDraw(pub u32);

impl RngCore for FixedDraw {
    fn next_u32(&mut self) -> u32 {
        self.0
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.0)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(self.0 as u8);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// One wake as seen from outside the node
#[derive(Debug, Clone)]
pub struct WakeRecord {
    /// Clock reading when the wake began
    pub woke_at: Timestamp,
    /// Result of the cycle
    pub outcome: CycleOutcome,
}

/// Sensor node running on a virtual clock
pub struct SimulatedNode<R: RngCore> {
    config: ScheduleConfig,
    clock: VirtualClock,
    arbiter: Option<Arbiter<R>>,
    delivered: Vec<Report>,
    wakes: Vec<WakeRecord>,
}

impl<R: RngCore> SimulatedNode<R> {
    /// Power on a node with an empty store at `start`
    pub fn new(config: ScheduleConfig, start: Timestamp, rng: R) -> Self {
        Self::with_store(config, start, MemoryStore::new(), rng)
    }

    /// Power on a node over an existing store
    pub fn with_store(config: ScheduleConfig, start: Timestamp, store: MemoryStore, rng: R) -> Self {
        let clock = VirtualClock::new(start);
        let arbiter = Self::build(config, &clock, store, rng);

        Self {
            config,
            clock,
            arbiter: Some(arbiter),
            delivered: Vec::new(),
            wakes: Vec::new(),
        }
    }

    fn build(config: ScheduleConfig, clock: &VirtualClock, store: MemoryStore, rng: R) -> Arbiter<R> {
        WakeArbiter::new(
            config,
            store,
            RecordingTransport::new(),
            GATEWAY,
            VirtualSleepTimer::new(clock.clone()),
            clock.clone(),
            rng,
        )
    }

    fn arbiter(&self) -> &Arbiter<R> {
        self.arbiter.as_ref().expect("node is powered")
    }

    fn arbiter_mut(&mut self) -> &mut Arbiter<R> {
        self.arbiter.as_mut().expect("node is powered")
    }

    /// Run one wake cycle, including the simulated sleep that ends it
    pub fn wake(&mut self) -> SchedulerResult<CycleOutcome> {
        let woke_at = self.clock.now();
        let outcome = self.arbiter_mut().run_cycle()?;
        self.wakes.push(WakeRecord { woke_at, outcome });
        Ok(outcome)
    }

    /// Wake repeatedly until the clock passes `until`
    pub fn run_until(&mut self, until: Timestamp) -> SchedulerResult<()> {
        while self.clock.now() < until {
            self.wake()?;
        }
        Ok(())
    }

    /// Lose everything but the store, then come back with new collaborators
    pub fn power_cycle(&mut self, config: ScheduleConfig, rng: R) {
        let arbiter = self.arbiter.take().expect("node is powered");
        self.delivered.extend_from_slice(arbiter.transport().reports());

        let store = arbiter.release();
        self.config = config;
        self.arbiter = Some(Self::build(config, &self.clock, store, rng));
    }

    /// Make the next `count` report sends fail
    pub fn drop_next_reports(&mut self, count: usize) {
        self.arbiter_mut().transport_mut().fail_next(count);
    }

    /// Direct access to the persisted schedule
    pub fn store(&self) -> &ScheduleStore<MemoryStore> {
        self.arbiter().store()
    }

    /// Mutable access to the persisted schedule
    pub fn store_mut(&mut self) -> &mut ScheduleStore<MemoryStore> {
        self.arbiter_mut().store_mut()
    }

    /// Virtual RTC
    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    /// Active configuration
    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Every report the gateway received, across power cycles
    pub fn delivered(&self) -> Vec<Report> {
        let mut all = self.delivered.clone();
        all.extend_from_slice(self.arbiter().transport().reports());
        all
    }

    /// Every wake so far
    pub fn wakes(&self) -> &[WakeRecord] {
        &self.wakes
    }

    /// Durations armed since the last power cycle, in milliseconds
    pub fn armed_millis(&self) -> Vec<u64> {
        self.arbiter()
            .timer()
            .history()
            .iter()
            .map(|duration| duration.ticks())
            .collect()
    }

    /// Delay every subsequent wake by `ms`
    pub fn set_wake_lateness(&mut self, ms: u64) {
        self.arbiter_mut().timer_mut().set_lateness_millis(ms);
    }
}
