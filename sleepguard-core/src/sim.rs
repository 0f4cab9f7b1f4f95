//! Host-side collaborators for simulated experiments (requires std)
//!
//! On a device, `suspend` powers down and the RTC keeps counting. Here a
//! [`VirtualClock`] stands in for the RTC and a [`VirtualSleepTimer`] moves
//! it forward by the armed duration when "suspending", so a three-hour
//! experiment replays in microseconds.
//!
//! ```rust
//! use sleepguard_core::sim::{RecordingTransport, VirtualClock, VirtualSleepTimer};
//! use sleepguard_core::store::MemoryStore;
//! use sleepguard_core::{ScheduleConfig, Timestamp, WakeArbiter};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let clock = VirtualClock::new(Timestamp::from_secs(0));
//! let mut arbiter = WakeArbiter::new(
//!     ScheduleConfig::default(),
//!     MemoryStore::new(),
//!     RecordingTransport::new(),
//!     "gateway",
//!     VirtualSleepTimer::new(clock.clone()),
//!     clock.clone(),
//!     StdRng::seed_from_u64(1),
//! );
//!
//! for _ in 0..5 {
//!     arbiter.run_cycle().unwrap();
//! }
//! assert_eq!(arbiter.transport().reports().len(), 5);
//! ```

use std::cell::Cell;
use std::rc::Rc;

use fugit::MillisDurationU64;

use crate::constants::time::US_PER_MS;
use crate::report::Report;
use crate::time::Timestamp;
use crate::traits::{Clock, ReportTransport, SleepTimer};

/// Shared, manually advanced clock
///
/// Clones observe the same time.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    now: Rc<Cell<Timestamp>>,
}

impl VirtualClock {
    /// Clock starting at `start`
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Jump to `timestamp`
    pub fn set(&self, timestamp: Timestamp) {
        self.now.set(timestamp);
    }

    /// Move forward by `ms` milliseconds
    pub fn advance_millis(&self, ms: u64) {
        let micros = self.now.get().as_micros().saturating_add(ms.saturating_mul(US_PER_MS));
        self.now.set(Timestamp::from_micros(micros));
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

/// Sleep timer that advances a [`VirtualClock`] on suspend
///
/// `lateness_ms` is added to every sleep to model oscillator drift or a
/// slow boot.
#[derive(Debug)]
pub struct VirtualSleepTimer {
    clock: VirtualClock,
    armed: Option<MillisDurationU64>,
    lateness_ms: u64,
    history: Vec<MillisDurationU64>,
}

impl VirtualSleepTimer {
    /// Timer driving `clock`
    pub fn new(clock: VirtualClock) -> Self {
        Self {
            clock,
            armed: None,
            lateness_ms: 0,
            history: Vec::new(),
        }
    }

    /// Wake every sleep `ms` late
    pub fn with_lateness_millis(mut self, ms: u64) -> Self {
        self.lateness_ms = ms;
        self
    }

    /// Change the lateness for subsequent sleeps
    pub fn set_lateness_millis(&mut self, ms: u64) {
        self.lateness_ms = ms;
    }

    /// Every duration armed so far
    pub fn history(&self) -> &[MillisDurationU64] {
        &self.history
    }

    /// Most recently armed duration
    pub fn last_armed(&self) -> Option<MillisDurationU64> {
        self.history.last().copied()
    }
}

impl SleepTimer for VirtualSleepTimer {
    fn arm_wake_timer(&mut self, duration: MillisDurationU64) {
        self.armed = Some(duration);
        self.history.push(duration);
    }

    fn suspend(&mut self) {
        // Unarmed suspend never wakes on hardware; here it returns at once
        if let Some(duration) = self.armed.take() {
            self.clock
                .advance_millis(duration.ticks().saturating_add(self.lateness_ms));
        }
    }
}

/// Error from a [`RecordingTransport`] set to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkDown;

/// Transport that keeps every report it is given
#[derive(Debug, Default)]
pub struct RecordingTransport {
    reports: Vec<Report>,
    failures: usize,
    fail_remaining: usize,
}

impl RecordingTransport {
    /// Transport that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` sends
    pub fn fail_next(&mut self, count: usize) {
        self.fail_remaining = count;
    }

    /// Reports accepted so far
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Sends rejected so far
    pub fn failures(&self) -> usize {
        self.failures
    }
}

impl ReportTransport for RecordingTransport {
    type Destination = &'static str;
    type Error = LinkDown;

    fn send_report(&mut self, report: &Report, _destination: &&'static str) -> Result<(), LinkDown> {
        if self.fail_remaining > 0 {
            self.fail_remaining -= 1;
            self.failures += 1;
            return Err(LinkDown);
        }
        self.reports.push(*report);
        Ok(())
    }
}

/// Transport that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

impl ReportTransport for LogTransport {
    type Destination = &'static str;
    type Error = core::convert::Infallible;

    fn send_report(
        &mut self,
        report: &Report,
        destination: &&'static str,
    ) -> Result<(), Self::Error> {
        log_info!(
            "-> {}: {} report from {} at {}",
            destination,
            report.kind,
            report.identity,
            report.sent_at
        );
        Ok(())
    }
}
