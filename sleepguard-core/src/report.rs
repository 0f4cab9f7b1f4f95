//! Report Types
//!
//! A sleepy node sends one of two report kinds per wake:
//!
//! - **Event** reports, tied to a pre-generated timeline entry
//! - **Battery** reports, a fixed-period heartbeat
//!
//! [`PendingReportKind`] is persisted between wakes as a one-byte tag. It is a
//! closed enum so every match over it is exhaustive; an unknown stored tag is
//! treated as corruption, never silently mapped to a default.
//!
//! [`DeviceIdentity`] tags every report. It is a random (v4) UUID generated
//! once at first power-on from the same entropy source as the timeline.

use core::fmt;

use rand_core::RngCore;
use uuid::{Builder, Uuid};

use crate::time::Timestamp;

/// Which report goes out at the next wake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PendingReportKind {
    /// Scheduled event report
    Event = 0,
    /// Periodic battery/heartbeat report
    Battery = 1,
}

impl PendingReportKind {
    /// Persisted tag
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Decode a persisted tag
    pub const fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Event),
            1 => Some(Self::Battery),
            _ => None,
        }
    }

    /// Human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Battery => "battery",
        }
    }

    /// Kind due first given both deadlines; ties go to the event
    ///
    /// `next_event` is `None` once the timeline is exhausted.
    pub fn earliest(next_event: Option<Timestamp>, battery_deadline: Timestamp) -> Self {
        match next_event {
            Some(event) if event <= battery_deadline => Self::Event,
            _ => Self::Battery,
        }
    }
}

impl fmt::Display for PendingReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PendingReportKind {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.name())
    }
}

/// Identifier generated once per device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceIdentity(Uuid);

impl DeviceIdentity {
    /// Encoded length in bytes
    pub const LEN: usize = 16;

    /// Draw a fresh random identity
    pub fn generate<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; Self::LEN];
        rng.fill_bytes(&mut bytes);
        Self(Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Rebuild from persisted bytes
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Raw bytes for persistence
    pub const fn as_bytes(&self) -> &[u8; Self::LEN] {
        self.0.as_bytes()
    }

    /// Underlying UUID
    pub const fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One outgoing report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Report {
    /// Report kind decided at the previous wake
    pub kind: PendingReportKind,
    /// Sending device
    pub identity: DeviceIdentity,
    /// Clock reading when the report was handed to the transport
    pub sent_at: Timestamp,
}

impl Report {
    /// Build a report
    pub const fn new(kind: PendingReportKind, identity: DeviceIdentity, sent_at: Timestamp) -> Self {
        Self {
            kind,
            identity,
            sent_at,
        }
    }
}
