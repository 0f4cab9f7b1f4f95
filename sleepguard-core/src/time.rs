//! Time management for the wake scheduler
//!
//! Timestamps are absolute points in time stored in microseconds, the
//! resolution of the RTC that survives deep sleep. Scheduling decisions work
//! in whole seconds; timer arming works in milliseconds. All arithmetic is
//! checked or saturating so a bad clock reading never wraps around.
//!
//! Provides clock sources for the host side:
//! - `FixedClock` (tests)
//! - `SystemClock` (wall clock, requires std)

use core::fmt;

use fugit::{MillisDurationU64, SecsDurationU64};

use crate::constants::time::{MS_PER_SECOND, US_PER_MS, US_PER_SECOND};
use crate::traits::Clock;

/// Absolute point in time, microseconds since the clock's epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(u64);

impl Timestamp {
    /// The clock epoch
    pub const ZERO: Self = Self(0);

    /// Create from microseconds
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Create from milliseconds, saturating on overflow
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(US_PER_MS))
    }

    /// Create from whole seconds, saturating on overflow
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(US_PER_SECOND))
    }

    /// Microseconds since epoch
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Milliseconds since epoch (truncated)
    pub const fn as_millis(self) -> u64 {
        self.0 / US_PER_MS
    }

    /// Whole seconds since epoch (truncated)
    pub const fn as_secs(self) -> u64 {
        self.0 / US_PER_SECOND
    }

    /// Drop the sub-second part
    pub const fn truncate_to_secs(self) -> Self {
        Self::from_secs(self.as_secs())
    }

    /// Add whole seconds, `None` on overflow
    pub const fn checked_add_secs(self, secs: u64) -> Option<Self> {
        match secs.checked_mul(US_PER_SECOND) {
            Some(micros) => match self.0.checked_add(micros) {
                Some(sum) => Some(Self(sum)),
                None => None,
            },
            None => None,
        }
    }

    /// Add a second-resolution duration, saturating at the end of time
    pub fn saturating_add(self, duration: SecsDurationU64) -> Self {
        self.checked_add_secs(duration.to_secs())
            .unwrap_or(Self(u64::MAX))
    }

    /// Signed milliseconds from `self` until `later`
    ///
    /// Negative when `later` is already in the past. Saturates at the `i64`
    /// bounds.
    pub fn millis_until(self, later: Timestamp) -> i64 {
        let (delta, negative) = if later.0 >= self.0 {
            (later.0 - self.0, false)
        } else {
            (self.0 - later.0, true)
        };

        let millis = i64::try_from(delta / US_PER_MS).unwrap_or(i64::MAX);
        if negative { -millis } else { millis }
    }

    /// Time until `later` as a timer duration, clamped at zero
    pub fn saturating_duration_until(self, later: Timestamp) -> MillisDurationU64 {
        MillisDurationU64::millis(self.millis_until(later).max(0) as u64)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}s", self.as_secs(), self.0 % US_PER_SECOND)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Timestamp {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}us", self.0)
    }
}

/// Convert a signed millisecond interval to whole seconds (truncating toward zero)
pub const fn millis_to_secs(millis: i64) -> i64 {
    millis / MS_PER_SECOND as i64
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedClock {
    timestamp: Timestamp,
}

impl FixedClock {
    /// Create a clock frozen at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// Jump to `timestamp`
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Move forward by `ms` milliseconds
    pub fn advance_millis(&mut self, ms: u64) {
        self.timestamp = Timestamp::from_micros(
            self.timestamp.as_micros().saturating_add(ms.saturating_mul(US_PER_MS)),
        );
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}

/// Wall clock (requires std)
///
/// Suitable for host runs where the OS clock keeps counting across a
/// simulated suspend.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime, UNIX_EPOCH};

        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros();
        Timestamp::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
    }
}
