//! Wake scheduling core for SleepGuard
//!
//! Decides when a battery-powered sensor node wakes and what it reports.
//! Two report streams share one radio: a fixed-period battery heartbeat and
//! a set of event reports drawn at random once per experiment. The node
//! sleeps between reports and remembers nothing in RAM across a suspend.
//!
//! Key constraints:
//! - Runs on ESP32-class parts in deep sleep between wakes
//! - No heap allocation (`heapless` collections)
//! - All state round-trips through a small key-value store
//!
//! ## Components
//!
//! - [`timeline`]: draws the event instants for the whole experiment
//! - [`store`]: persists timeline, identity, cursor and deadlines
//! - [`arbiter`]: runs one wake: dispatch, decide, commit, suspend
//!
//! ```no_run
//! use sleepguard_core::sim::{LogTransport, VirtualClock, VirtualSleepTimer};
//! use sleepguard_core::store::MemoryStore;
//! use sleepguard_core::{DeploymentRole, ScheduleConfig, Timestamp, WakeArbiter};
//! use rand_core::OsRng;
//!
//! let clock = VirtualClock::new(Timestamp::ZERO);
//! let mut arbiter = WakeArbiter::new(
//!     ScheduleConfig::for_role(DeploymentRole::SecondStory),
//!     MemoryStore::new(),
//!     LogTransport,
//!     "coap://gateway/report",
//!     VirtualSleepTimer::new(clock.clone()),
//!     clock,
//!     OsRng,
//! );
//!
//! // On hardware each call ends in deep sleep and the next wake reboots
//! let outcome = arbiter.run_cycle()?;
//! # Ok::<(), sleepguard_core::SchedulerError>(())
//! ```
//!
//! ## Features
//!
//! - `std` (default): serde support, `log` output, OS entropy, [`sim`]
//! - `store-file`: JSON [`store::FileStore`] for host runs
//! - `host`: `std` + `store-file`, needed by the demo and the file tests
//! - `embedded` / `esp32`: `defmt` formatting for device builds
//!
//! The file-store tests only build with the host preset:
//!
//! ```bash
//! cargo test --features host
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod arbiter;
pub mod config;
pub mod constants;
pub mod errors;
pub mod report;
pub mod store;
pub mod time;
pub mod timeline;
pub mod traits;

#[cfg(feature = "std")]
pub mod sim;

// Public API
pub use arbiter::{arbitrate, CycleOutcome, WakeArbiter, WakeDecision};
pub use config::{DeploymentRole, ScheduleConfig};
pub use errors::{
    ConfigError, ConfigResult, SchedulerError, SchedulerResult, StorageError, StorageResult,
};
pub use report::{DeviceIdentity, PendingReportKind, Report};
pub use store::{KeyValueStore, ScheduleCursor, ScheduleSnapshot, ScheduleStore, SeedOutcome};
pub use time::{FixedClock, Timestamp};
pub use timeline::EventTimeline;
pub use traits::{Clock, ReportTransport, SleepTimer};

#[cfg(feature = "std")]
pub use time::SystemClock;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
