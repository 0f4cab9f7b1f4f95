//! Scheduling configuration
//!
//! Declared once per deployment and never derived at runtime. A device's
//! role fixes how many events it reports over the experiment; the battery
//! heartbeat period and guard offset are shared by all roles.
//!
//! ```rust
//! use sleepguard_core::{DeploymentRole, ScheduleConfig};
//!
//! let config = ScheduleConfig::for_role(DeploymentRole::FrontDoor)
//!     .with_battery_period_secs(30)
//!     .with_guard_offset_secs(15);
//!
//! assert_eq!(config.event_count, 10);
//! assert!(config.validate().is_ok());
//! ```

use fugit::SecsDurationU64;

use crate::constants::schedule::{
    DEFAULT_BATTERY_PERIOD_S, DEFAULT_EXPERIMENT_DURATION_S, DEFAULT_GUARD_OFFSET_S,
    EVENTS_FRONT_DOOR, EVENTS_SECOND_STORY, EVENTS_WATER_LEAK, MAX_EVENTS,
};
use crate::constants::time::MAX_EXPERIMENT_DURATION_S;
use crate::errors::{ConfigError, ConfigResult};

/// Role a node plays in the experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum DeploymentRole {
    /// Reports a single leak event
    WaterLeak,
    /// Reports door openings
    FrontDoor,
    /// Reports upstairs motion
    SecondStory,
}

impl DeploymentRole {
    /// Number of event reports for this role
    pub const fn event_count(self) -> usize {
        match self {
            Self::WaterLeak => EVENTS_WATER_LEAK,
            Self::FrontDoor => EVENTS_FRONT_DOOR,
            Self::SecondStory => EVENTS_SECOND_STORY,
        }
    }
}

/// Parameters for timeline generation and arbitration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct ScheduleConfig {
    /// Events placed over the experiment window
    pub event_count: usize,

    /// Length of the experiment window in seconds
    pub experiment_duration_secs: u64,

    /// Battery report period in seconds
    pub battery_period_secs: u64,

    /// Distance in seconds from a battery instant to the event placed after it
    pub guard_offset_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self::for_role(DeploymentRole::FrontDoor)
    }
}

impl ScheduleConfig {
    /// Defaults for a deployment role
    pub const fn for_role(role: DeploymentRole) -> Self {
        Self {
            event_count: role.event_count(),
            experiment_duration_secs: DEFAULT_EXPERIMENT_DURATION_S,
            battery_period_secs: DEFAULT_BATTERY_PERIOD_S,
            guard_offset_secs: DEFAULT_GUARD_OFFSET_S,
        }
    }

    /// Override the event count
    pub const fn with_event_count(mut self, count: usize) -> Self {
        self.event_count = count;
        self
    }

    /// Override the experiment duration
    pub const fn with_experiment_duration_secs(mut self, secs: u64) -> Self {
        self.experiment_duration_secs = secs;
        self
    }

    /// Override the battery period
    pub const fn with_battery_period_secs(mut self, secs: u64) -> Self {
        self.battery_period_secs = secs;
        self
    }

    /// Override the guard offset
    pub const fn with_guard_offset_secs(mut self, secs: u64) -> Self {
        self.guard_offset_secs = secs;
        self
    }

    /// Experiment window length
    pub const fn experiment_duration(&self) -> SecsDurationU64 {
        SecsDurationU64::secs(self.experiment_duration_secs)
    }

    /// Battery report period
    pub const fn battery_period(&self) -> SecsDurationU64 {
        SecsDurationU64::secs(self.battery_period_secs)
    }

    /// Width of one segment in whole seconds
    ///
    /// The sub-second remainder of `duration / count` is dropped, so the
    /// segments may cover slightly less than the full window.
    pub const fn segment_width_secs(&self) -> u64 {
        if self.event_count == 0 {
            0
        } else {
            self.experiment_duration_secs / self.event_count as u64
        }
    }

    /// Minimum separation between any event and any battery instant
    pub const fn guard_window_secs(&self) -> u64 {
        let after = self.guard_offset_secs;
        let before = self.battery_period_secs.saturating_sub(self.guard_offset_secs);
        if after < before { after } else { before }
    }

    /// Check that a timeline can be generated from this configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.event_count == 0 {
            return Err(ConfigError::ZeroEventCount);
        }

        if self.event_count > MAX_EVENTS {
            return Err(ConfigError::TooManyEvents {
                requested: self.event_count,
                max: MAX_EVENTS,
            });
        }

        if self.experiment_duration_secs == 0 {
            return Err(ConfigError::ZeroDuration);
        }

        if self.experiment_duration_secs > MAX_EXPERIMENT_DURATION_S {
            return Err(ConfigError::HorizonOverflow);
        }

        if self.battery_period_secs == 0 {
            return Err(ConfigError::ZeroBatteryPeriod);
        }

        if self.guard_offset_secs == 0 || self.guard_offset_secs >= self.battery_period_secs {
            return Err(ConfigError::GuardOffsetOutOfRange {
                offset_secs: self.guard_offset_secs,
                period_secs: self.battery_period_secs,
            });
        }

        let width = self.segment_width_secs();
        if width == 0 {
            return Err(ConfigError::SegmentTooNarrow {
                event_count: self.event_count,
                duration_secs: self.experiment_duration_secs,
            });
        }

        Ok(())
    }
}
