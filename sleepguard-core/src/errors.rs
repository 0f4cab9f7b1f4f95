//! Error Types for the Wake Scheduler
//!
//! ## Design Philosophy
//!
//! The scheduler runs once per wake on a battery-powered node, so errors follow
//! the same constraints as the rest of the core:
//!
//! 1. **No Heap Allocation**: variants carry integers and `&'static str` only.
//!
//! 2. **Copy Semantics**: errors are small and returned by value.
//!
//! 3. **Recoverable by Default**: most failures are absorbed by the arbiter.
//!    Only configuration mistakes and a store that cannot even be re-seeded
//!    reach the caller.
//!
//! ## Error Categories
//!
//! ### Configuration (`ConfigError`)
//! Invalid event count, experiment duration, battery period or guard offset.
//! Fatal at generation time; a corrupt timeline is never produced.
//!
//! ### Storage (`StorageError`)
//! Missing or undecodable persisted fields. The arbiter treats these as a
//! first power-on and re-seeds. `Backend` failures that persist through a
//! re-seed are surfaced as `SchedulerError::Storage`.
//!
//! ### Transport and clock skew
//! Not represented here. A failed report send is logged and reported in the
//! cycle outcome; a late wake is clamped to a zero-length sleep.
//!
//! ## Handling Strategy
//!
//! ```rust
//! use sleepguard_core::{ConfigError, ScheduleConfig};
//!
//! let config = ScheduleConfig::default()
//!     .with_event_count(36)
//!     .with_experiment_duration_secs(20);
//! match config.validate() {
//!     Ok(()) => {}
//!     Err(ConfigError::SegmentTooNarrow { event_count, duration_secs }) => {
//!         // Fewer events or a longer experiment would fix this
//!         assert!(duration_secs < event_count as u64);
//!     }
//!     Err(_) => {}
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for configuration checks and timeline generation
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for persistent store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for a full wake cycle
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Invalid scheduling configuration
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// At least one event must be scheduled
    #[error("Event count must be at least 1")]
    ZeroEventCount,

    /// More events than the timeline can hold
    #[error("Event count {requested} exceeds capacity {max}")]
    TooManyEvents {
        /// Requested number of events
        requested: usize,
        /// Timeline capacity
        max: usize,
    },

    /// Experiment window has no length
    #[error("Experiment duration must be positive")]
    ZeroDuration,

    /// Battery reports need a period to recur
    #[error("Battery period must be positive")]
    ZeroBatteryPeriod,

    /// Guard offset must fall strictly inside one battery period
    #[error("Guard offset {offset_secs}s outside (0, {period_secs}s)")]
    GuardOffsetOutOfRange {
        /// Configured guard offset in seconds
        offset_secs: u64,
        /// Configured battery period in seconds
        period_secs: u64,
    },

    /// Duration shorter than one whole second per event
    #[error("{event_count} events do not fit in {duration_secs}s")]
    SegmentTooNarrow {
        /// Requested number of events
        event_count: usize,
        /// Experiment duration in seconds
        duration_secs: u64,
    },

    /// Experiment window extends past the representable time range
    #[error("Experiment window overflows the timestamp range")]
    HorizonOverflow,
}

/// Persistent store failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Required field has never been written
    #[error("Missing field: {key}")]
    Missing {
        /// Field key
        key: &'static str,
    },

    /// Field exists but cannot be decoded
    #[error("Corrupt field {key}: {reason}")]
    Corrupt {
        /// Field key
        key: &'static str,
        /// What failed to decode
        reason: &'static str,
    },

    /// Value does not fit the backend or the caller's buffer
    #[error("Field {key} exceeds capacity")]
    CapacityExceeded {
        /// Field key
        key: &'static str,
    },

    /// Underlying storage failed
    #[error("Storage backend failure: {reason}")]
    Backend {
        /// Backend-specific description
        reason: &'static str,
    },
}

impl StorageError {
    /// Returns `true` for errors that a re-seed recovers from
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Missing { .. } | Self::Corrupt { .. })
    }
}

/// Errors surfaced from a wake cycle
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// Configuration rejected before a timeline could be generated
    #[error("Configuration error: {0}")]
    Config(ConfigError),

    /// Store could not be read or re-seeded
    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<ConfigError> for SchedulerError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<StorageError> for SchedulerError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ZeroEventCount => defmt::write!(fmt, "Event count is zero"),
            Self::TooManyEvents { requested, max } =>
                defmt::write!(fmt, "{} events exceed capacity {}", requested, max),
            Self::ZeroDuration => defmt::write!(fmt, "Experiment duration is zero"),
            Self::ZeroBatteryPeriod => defmt::write!(fmt, "Battery period is zero"),
            Self::GuardOffsetOutOfRange { offset_secs, period_secs } =>
                defmt::write!(fmt, "Guard {}s outside (0, {}s)", offset_secs, period_secs),
            Self::SegmentTooNarrow { event_count, duration_secs } =>
                defmt::write!(fmt, "{} events do not fit in {}s", event_count, duration_secs),
            Self::HorizonOverflow => defmt::write!(fmt, "Timestamp overflow"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StorageError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Missing { key } => defmt::write!(fmt, "Missing {}", key),
            Self::Corrupt { key, reason } => defmt::write!(fmt, "Corrupt {}: {}", key, reason),
            Self::CapacityExceeded { key } => defmt::write!(fmt, "{} exceeds capacity", key),
            Self::Backend { reason } => defmt::write!(fmt, "Backend: {}", reason),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SchedulerError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Config(err) => defmt::write!(fmt, "Config: {}", err),
            Self::Storage(err) => defmt::write!(fmt, "Storage: {}", err),
        }
    }
}
