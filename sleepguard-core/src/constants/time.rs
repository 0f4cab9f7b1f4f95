//! Time-Related Constants
//!
//! Conversion factors between the resolutions the scheduler works in:
//! whole seconds for placement decisions, milliseconds for timer arming and
//! microseconds for persisted timestamps.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Microseconds per millisecond.
pub const US_PER_MS: u64 = 1000;

/// Microseconds per second.
pub const US_PER_SECOND: u64 = 1_000_000;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u64 = 60;

/// Minutes per hour.
pub const MINUTES_PER_HOUR: u64 = 60;

/// Seconds per hour.
pub const SECONDS_PER_HOUR: u64 = SECONDS_PER_MINUTE * MINUTES_PER_HOUR;

// ===== HORIZON =====

/// Longest experiment window accepted by the configuration (seconds).
///
/// Thirty days. Keeps every timestamp offset far from `u64` microsecond
/// overflow and bounds the battery-slot arithmetic.
pub const MAX_EXPERIMENT_DURATION_S: u64 = 30 * 24 * SECONDS_PER_HOUR;
