//! Pre-built deployment scenarios
//!
//! Covers the three deployment roles plus a short experiment that keeps
//! tests with many wakes fast.

use sleepguard_core::{DeploymentRole, ScheduleConfig, Timestamp};

/// A deployment to simulate
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub config: ScheduleConfig,
    pub power_on: Timestamp,
}

impl Scenario {
    /// Experiment start: power-on truncated to the second
    pub fn start(&self) -> Timestamp {
        self.power_on.truncate_to_secs()
    }

    /// First instant past the experiment window
    pub fn end(&self) -> Timestamp {
        self.start()
            .checked_add_secs(self.config.experiment_duration_secs)
            .expect("scenario window fits")
    }

    /// `secs` seconds after the start
    pub fn at(&self, secs: u64) -> Timestamp {
        self.start().checked_add_secs(secs).expect("offset fits")
    }
}

/// RTC reading at power-on, deliberately not second-aligned
pub const POWER_ON: Timestamp = Timestamp::from_micros(1_700_000_000_250_000);

pub struct Scenarios;

impl Scenarios {
    /// One leak event over three hours
    pub fn water_leak() -> Scenario {
        Scenario {
            name: "water_leak",
            config: ScheduleConfig::for_role(DeploymentRole::WaterLeak),
            power_on: POWER_ON,
        }
    }

    /// Ten door events over three hours
    pub fn front_door() -> Scenario {
        Scenario {
            name: "front_door",
            config: ScheduleConfig::for_role(DeploymentRole::FrontDoor),
            power_on: POWER_ON,
        }
    }

    /// Thirty-six motion events over three hours
    pub fn second_story() -> Scenario {
        Scenario {
            name: "second_story",
            config: ScheduleConfig::for_role(DeploymentRole::SecondStory),
            power_on: POWER_ON,
        }
    }

    /// Four events over ten minutes
    pub fn short() -> Scenario {
        Scenario {
            name: "short",
            config: ScheduleConfig::default()
                .with_event_count(4)
                .with_experiment_duration_secs(600),
            power_on: Timestamp::from_secs(10_000),
        }
    }

    /// All role scenarios
    pub fn roles() -> [Scenario; 3] {
        [Self::water_leak(), Self::front_door(), Self::second_story()]
    }
}
