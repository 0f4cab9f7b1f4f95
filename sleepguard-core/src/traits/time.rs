//! Clock Abstraction for Sleepy Devices
//!
//! The scheduler compares persisted absolute deadlines against "now" after
//! every wake, so the clock must keep counting while the processor is
//! powered down.
//!
//! ## Implementation Requirements
//!
//! - Backed by a source that survives suspend (RTC, or the OS clock on host)
//! - Monotonic across wakes for the length of one experiment
//! - Microsecond epoch is arbitrary but must not change between wakes
//!
//! ## Example Implementation
//!
//! ```rust
//! use sleepguard_core::traits::Clock;
//! use sleepguard_core::time::Timestamp;
//!
//! struct RtcClock {
//!     // ... RTC peripheral handle
//! }
//!
//! impl Clock for RtcClock {
//!     fn now(&self) -> Timestamp {
//!         // Read the RTC counter and convert to microseconds
//!         Timestamp::from_micros(0) // placeholder
//!     }
//! }
//! ```

use crate::time::Timestamp;

/// Source of absolute time that survives suspend
pub trait Clock {
    /// Current time
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
