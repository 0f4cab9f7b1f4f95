//! Simulated Experiment Example
//!
//! Replays a full experiment for one sensor node on a virtual clock. Every
//! wake reopens the schedule from a JSON file, as the device reloads it from
//! flash after deep sleep.
//!
//! ## What You'll Learn
//!
//! - Wiring the arbiter to a store, transport, timer, clock and RNG
//! - How event and battery reports interleave over an experiment
//! - Resuming an interrupted experiment from the persisted store
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example wake_cycles --features host -- second-story /tmp/node.json
//! ```
//!
//! Run it twice with the same file and the second run continues the first
//! experiment instead of drawing a new one.

use std::env;
use std::path::PathBuf;

use log::{Level, LevelFilter, Log, Metadata, Record};
use rand_core::OsRng;
use sleepguard_core::{
    sim::{LogTransport, VirtualClock, VirtualSleepTimer},
    store::FileStore,
    Clock, DeploymentRole, PendingReportKind, ScheduleConfig, ScheduleStore, SchedulerError,
    SystemClock, WakeArbiter,
};

/// Prints log records to stdout
struct StdoutLogger;

impl Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("  [{:<5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StdoutLogger = StdoutLogger;

fn parse_role(arg: Option<&str>) -> DeploymentRole {
    match arg {
        Some("water-leak") => DeploymentRole::WaterLeak,
        Some("second-story") => DeploymentRole::SecondStory,
        _ => DeploymentRole::FrontDoor,
    }
}

fn main() -> Result<(), SchedulerError> {
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Info));

    let args: Vec<String> = env::args().collect();
    let role = parse_role(args.get(1).map(String::as_str));
    let path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("sleepguard-demo.json"));

    let config = ScheduleConfig::for_role(role);
    println!("=== SleepGuard Wake Cycle Simulation ===\n");
    println!("Role:        {:?} ({} events)", role, config.event_count);
    println!("Experiment:  {} s", config.experiment_duration_secs);
    println!("Battery:     every {} s", config.battery_period_secs);
    println!("Store:       {}\n", path.display());

    // Resume where a previous run left off, otherwise start from the wall clock
    let resume_at = FileStore::open(&path)
        .ok()
        .map(ScheduleStore::new)
        .and_then(|store| store.battery_deadline().ok());
    let clock = VirtualClock::new(resume_at.unwrap_or_else(|| SystemClock.now()));

    let horizon = clock
        .now()
        .checked_add_secs(config.experiment_duration_secs + config.battery_period_secs)
        .ok_or(SchedulerError::Config(sleepguard_core::ConfigError::HorizonOverflow))?;

    let mut wakes = 0usize;
    let mut events = 0usize;
    let mut failed = 0usize;

    while clock.now() < horizon {
        let store = FileStore::open(&path)?;
        let mut arbiter = WakeArbiter::new(
            config,
            store,
            LogTransport,
            "coap://[fd00::1]/report",
            VirtualSleepTimer::new(clock.clone()),
            clock.clone(),
            OsRng,
        );

        let outcome = arbiter.run_cycle()?;
        wakes += 1;
        if outcome.dispatched == PendingReportKind::Event {
            events += 1;
        }
        if !outcome.dispatch_ok {
            failed += 1;
        }
        if outcome.first_boot {
            println!("  (new experiment seeded)");
        }
    }

    println!("\n=== Summary ===");
    println!("Wakes:          {}", wakes);
    println!("Event reports:  {}", events);
    println!("Battery reports: {}", wakes - events);
    println!("Failed sends:   {}", failed);

    Ok(())
}
