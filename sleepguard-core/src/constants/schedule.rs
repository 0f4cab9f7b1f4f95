//! Scheduling Constants
//!
//! Defaults for the experiment window, battery heartbeat and event counts per
//! deployment role.

use super::time::SECONDS_PER_HOUR;

// ===== EXPERIMENT WINDOW =====

/// Default experiment duration (seconds).
///
/// Three hours of reporting after first power-on.
pub const DEFAULT_EXPERIMENT_DURATION_S: u64 = 3 * SECONDS_PER_HOUR;

// ===== BATTERY HEARTBEAT =====

/// Default battery report period (seconds).
///
/// The first battery report goes out at power-on, then every period.
pub const DEFAULT_BATTERY_PERIOD_S: u64 = 30;

/// Default guard offset between a battery instant and an event (seconds).
///
/// Half the battery period, placing every event midway between two
/// battery reports.
pub const DEFAULT_GUARD_OFFSET_S: u64 = 15;

// ===== EVENT COUNTS PER ROLE =====

/// Events sent by a water-leak detector over one experiment.
pub const EVENTS_WATER_LEAK: usize = 1;

/// Events sent by a front-door sensor over one experiment.
pub const EVENTS_FRONT_DOOR: usize = 10;

/// Events sent by a second-story motion sensor over one experiment.
pub const EVENTS_SECOND_STORY: usize = 36;

// ===== CAPACITY =====

/// Maximum events a timeline can hold.
///
/// Sized for the largest role with headroom; the persisted blob is
/// `MAX_EVENTS * 8` bytes.
pub const MAX_EVENTS: usize = 64;
