//! Constants for SleepGuard Core
//!
//! Centralized constants used by the scheduler. Values that describe a
//! deployment (durations, periods, event counts) live in [`schedule`]; unit
//! conversions and horizon limits live in [`time`].
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Include the unit in every name (`_S`, `_MS`, `_US`)
//! 3. Group related constants together

/// Experiment, battery and per-role event defaults.
pub mod schedule;

/// Time unit conversions and horizon limits.
pub mod time;

// Re-export commonly used constants for convenience
pub use schedule::{
    DEFAULT_BATTERY_PERIOD_S, DEFAULT_EXPERIMENT_DURATION_S, DEFAULT_GUARD_OFFSET_S,
    EVENTS_FRONT_DOOR, EVENTS_SECOND_STORY, EVENTS_WATER_LEAK, MAX_EVENTS,
};

pub use time::{MS_PER_SECOND, US_PER_MS, US_PER_SECOND};
