//! Wake timer and suspend
//!
//! On hardware `suspend` enters deep sleep and never returns: the next wake
//! restarts the program from its entry point with volatile memory lost.
//! Host implementations return from `suspend` so tests and simulations can
//! continue with the next cycle.

use fugit::MillisDurationU64;

/// Low-power timer driver
pub trait SleepTimer {
    /// Arm the wake-up timer to fire after `duration`
    ///
    /// A zero duration wakes immediately.
    fn arm_wake_timer(&mut self, duration: MillisDurationU64);

    /// Enter the suspended state until the armed timer fires
    fn suspend(&mut self);
}
