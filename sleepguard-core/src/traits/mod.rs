//! Collaborator Traits for SleepGuard
//!
//! The wake scheduler owns the decision logic only. Everything that touches
//! hardware or the network is reached through these traits so the same core
//! runs on the device and in host tests.
//!
//! ## Module Organization
//!
//! - [`time`] - Clock that survives suspend (RTC)
//! - [`transport`] - Report dispatch
//! - [`sleep`] - Wake timer and suspend
//!
//! The durable key-value store trait lives next to its typed wrapper in
//! [`crate::store`].
//!
//! ## Design Philosophy
//!
//! - **Narrow contracts**: each trait exposes only what one wake cycle needs
//! - **Static dispatch**: the arbiter is generic over its collaborators
//! - **No allocation**: all methods work on borrowed, fixed-size data

pub mod sleep;
pub mod time;
pub mod transport;

pub use sleep::SleepTimer;
pub use time::Clock;
pub use transport::ReportTransport;
