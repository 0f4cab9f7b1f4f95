//! Persistent Schedule Store
//!
//! Everything the scheduler needs to survive deep sleep lives here. Volatile
//! memory is lost on every suspend, so each wake rebuilds its view of the
//! schedule from five fields:
//!
//! | Key              | Contents                          | Encoding            |
//! |------------------|-----------------------------------|---------------------|
//! | `events`         | event timeline                    | N x u64 LE micros   |
//! | `uuid`           | device identity                   | 16 raw bytes        |
//! | `battery_wakeup` | next battery deadline             | u64 LE micros       |
//! | `events_index`   | cursor into the timeline          | u8                  |
//! | `packet_type`    | report to send at next wake       | u8 tag              |
//!
//! ## Seeding
//!
//! [`ScheduleStore::seed_if_absent`] writes all five fields at first
//! power-on. The timeline is written last and doubles as the "seeded"
//! marker, so a seed interrupted by power loss reads back as unseeded and is
//! redone from scratch on the next boot.
//!
//! ## Backends
//!
//! - [`MemoryStore`]: fixed-capacity, no heap (tests, RAM-retained targets)
//! - [`FileStore`]: JSON file with atomic replace (host runs, requires `store-file`)
//!
//! Hardware ports implement [`KeyValueStore`] over their flash driver.

pub mod memory;

#[cfg(feature = "store-file")]
pub mod file;

pub use memory::MemoryStore;

#[cfg(feature = "store-file")]
pub use file::FileStore;

use heapless::Vec;

use crate::constants::schedule::MAX_EVENTS;
use crate::errors::{StorageError, StorageResult};
use crate::report::{DeviceIdentity, PendingReportKind};
use crate::time::Timestamp;
use crate::timeline::EventTimeline;

/// Key of the persisted timeline
pub const KEY_EVENTS: &str = "events";
/// Key of the device identity
pub const KEY_IDENTITY: &str = "uuid";
/// Key of the next battery deadline
pub const KEY_BATTERY_DEADLINE: &str = "battery_wakeup";
/// Key of the timeline cursor
pub const KEY_CURSOR: &str = "events_index";
/// Key of the pending report kind
pub const KEY_PENDING: &str = "packet_type";

/// Largest value any schedule field occupies
pub const MAX_VALUE_LEN: usize = MAX_EVENTS * TIMESTAMP_LEN;

const TIMESTAMP_LEN: usize = 8;

/// Byte-oriented persistent storage surviving suspend
///
/// Values are opaque byte strings keyed by static names. Writes must be
/// durable once they return `Ok`.
pub trait KeyValueStore {
    /// Copy the value for `key` into `buf`
    ///
    /// Returns `Ok(None)` if the key was never written and
    /// [`StorageError::CapacityExceeded`] if `buf` is too small.
    fn read_blob(&self, key: &'static str, buf: &mut [u8]) -> StorageResult<Option<usize>>;

    /// Replace the value for `key`
    fn write_blob(&mut self, key: &'static str, value: &[u8]) -> StorageResult<()>;

    /// Whether `key` holds a value
    fn contains(&self, key: &'static str) -> StorageResult<bool>;

    /// Remove every key
    fn erase_all(&mut self) -> StorageResult<()>;

    /// Read a one-byte value
    fn read_u8(&self, key: &'static str) -> StorageResult<Option<u8>> {
        let mut buf = [0u8; 1];
        match read_exact(self, key, &mut buf)? {
            Some(()) => Ok(Some(buf[0])),
            None => Ok(None),
        }
    }

    /// Write a one-byte value
    fn write_u8(&mut self, key: &'static str, value: u8) -> StorageResult<()> {
        self.write_blob(key, &[value])
    }

    /// Read a little-endian u64
    fn read_u64(&self, key: &'static str) -> StorageResult<Option<u64>> {
        let mut buf = [0u8; 8];
        match read_exact(self, key, &mut buf)? {
            Some(()) => Ok(Some(u64::from_le_bytes(buf))),
            None => Ok(None),
        }
    }

    /// Write a little-endian u64
    fn write_u64(&mut self, key: &'static str, value: u64) -> StorageResult<()> {
        self.write_blob(key, &value.to_le_bytes())
    }
}

/// Read a value that must fill `buf` exactly
fn read_exact<K: KeyValueStore + ?Sized>(
    store: &K,
    key: &'static str,
    buf: &mut [u8],
) -> StorageResult<Option<()>> {
    let corrupt = StorageError::Corrupt {
        key,
        reason: "unexpected length",
    };

    match store.read_blob(key, buf) {
        Ok(Some(len)) if len == buf.len() => Ok(Some(())),
        Ok(Some(_)) | Err(StorageError::CapacityExceeded { .. }) => Err(corrupt),
        Ok(None) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Position of the next unsent event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ScheduleCursor(u8);

impl ScheduleCursor {
    /// Cursor at the start of the timeline
    pub const START: Self = Self(0);

    /// Wrap a raw cursor value
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Raw persisted value
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Index into the timeline
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Cursor one event further
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Result of [`ScheduleStore::seed_if_absent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Fields written for the first time
    Seeded,
    /// A timeline already existed; nothing was written
    AlreadySeeded,
}

/// Everything persisted, read back in one go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSnapshot {
    /// Event timeline
    pub timeline: EventTimeline,
    /// Device identity
    pub identity: DeviceIdentity,
    /// Next battery deadline
    pub battery_deadline: Timestamp,
    /// Next unsent event
    pub cursor: ScheduleCursor,
    /// Report to send at this wake
    pub pending: PendingReportKind,
}

impl ScheduleSnapshot {
    /// Next unsent event, `None` once exhausted
    pub fn next_event(&self) -> Option<Timestamp> {
        self.timeline.get(self.cursor.index())
    }

    /// Events still to be sent
    pub fn events_remaining(&self) -> usize {
        self.timeline.len().saturating_sub(self.cursor.index())
    }
}

/// Typed view over a [`KeyValueStore`]
#[derive(Debug)]
pub struct ScheduleStore<K> {
    backend: K,
}

impl<K: KeyValueStore> ScheduleStore<K> {
    /// Wrap a backend
    pub fn new(backend: K) -> Self {
        Self { backend }
    }

    /// Underlying backend
    pub fn backend(&self) -> &K {
        &self.backend
    }

    /// Underlying backend, mutable
    pub fn backend_mut(&mut self) -> &mut K {
        &mut self.backend
    }

    /// Give the backend back
    pub fn into_inner(self) -> K {
        self.backend
    }

    /// Whether a complete seed has been written
    pub fn is_seeded(&self) -> StorageResult<bool> {
        self.backend.contains(KEY_EVENTS)
    }

    /// Write every field unless a timeline already exists
    ///
    /// `battery_deadline` is the first battery instant. The pending kind is
    /// whichever of the first event and that deadline comes first.
    pub fn seed_if_absent(
        &mut self,
        timeline: &EventTimeline,
        identity: &DeviceIdentity,
        battery_deadline: Timestamp,
    ) -> StorageResult<SeedOutcome> {
        if self.is_seeded()? {
            return Ok(SeedOutcome::AlreadySeeded);
        }

        let pending = PendingReportKind::earliest(timeline.first(), battery_deadline);

        self.backend.write_blob(KEY_IDENTITY, identity.as_bytes())?;
        self.backend.write_u64(KEY_BATTERY_DEADLINE, battery_deadline.as_micros())?;
        self.backend.write_u8(KEY_CURSOR, ScheduleCursor::START.value())?;
        self.backend.write_u8(KEY_PENDING, pending.to_u8())?;
        self.store_timeline(timeline)?;

        log_debug!("seeded {} events, first battery at {}", timeline.len(), battery_deadline);
        Ok(SeedOutcome::Seeded)
    }

    /// Read timeline, identity and battery deadline
    pub fn load(&self) -> StorageResult<(EventTimeline, DeviceIdentity, Timestamp)> {
        Ok((self.timeline()?, self.identity()?, self.battery_deadline()?))
    }

    /// Read every field and check they agree with each other
    pub fn snapshot(&self) -> StorageResult<ScheduleSnapshot> {
        let (timeline, identity, battery_deadline) = self.load()?;
        let cursor = self.cursor()?;
        let pending = self.pending_kind()?;

        if cursor.index() > timeline.len() {
            return Err(StorageError::Corrupt {
                key: KEY_CURSOR,
                reason: "cursor past end of timeline",
            });
        }

        Ok(ScheduleSnapshot {
            timeline,
            identity,
            battery_deadline,
            cursor,
            pending,
        })
    }

    /// Persisted timeline
    pub fn timeline(&self) -> StorageResult<EventTimeline> {
        let mut buf = [0u8; MAX_VALUE_LEN];
        let len = self
            .backend
            .read_blob(KEY_EVENTS, &mut buf)
            .map_err(|err| match err {
                StorageError::CapacityExceeded { key } => StorageError::Corrupt {
                    key,
                    reason: "timeline exceeds capacity",
                },
                other => other,
            })?
            .ok_or(StorageError::Missing { key: KEY_EVENTS })?;

        decode_timeline(&buf[..len])
    }

    /// Persisted identity
    pub fn identity(&self) -> StorageResult<DeviceIdentity> {
        let mut buf = [0u8; DeviceIdentity::LEN];
        read_exact(&self.backend, KEY_IDENTITY, &mut buf)?
            .ok_or(StorageError::Missing { key: KEY_IDENTITY })?;
        Ok(DeviceIdentity::from_bytes(buf))
    }

    /// Next battery deadline
    pub fn battery_deadline(&self) -> StorageResult<Timestamp> {
        self.backend
            .read_u64(KEY_BATTERY_DEADLINE)?
            .map(Timestamp::from_micros)
            .ok_or(StorageError::Missing { key: KEY_BATTERY_DEADLINE })
    }

    /// Replace the battery deadline
    pub fn set_battery_deadline(&mut self, deadline: Timestamp) -> StorageResult<()> {
        self.backend.write_u64(KEY_BATTERY_DEADLINE, deadline.as_micros())
    }

    /// Current cursor
    pub fn cursor(&self) -> StorageResult<ScheduleCursor> {
        self.backend
            .read_u8(KEY_CURSOR)?
            .map(ScheduleCursor::new)
            .ok_or(StorageError::Missing { key: KEY_CURSOR })
    }

    /// Move the cursor past the current event and return the new position
    pub fn advance_cursor(&mut self) -> StorageResult<ScheduleCursor> {
        let next = self.cursor()?.next();
        self.backend.write_u8(KEY_CURSOR, next.value())?;
        Ok(next)
    }

    /// Report kind to send at the next wake
    pub fn pending_kind(&self) -> StorageResult<PendingReportKind> {
        let tag = self
            .backend
            .read_u8(KEY_PENDING)?
            .ok_or(StorageError::Missing { key: KEY_PENDING })?;

        PendingReportKind::from_u8(tag).ok_or(StorageError::Corrupt {
            key: KEY_PENDING,
            reason: "unknown report kind",
        })
    }

    /// Replace the pending report kind
    pub fn set_pending_kind(&mut self, kind: PendingReportKind) -> StorageResult<()> {
        self.backend.write_u8(KEY_PENDING, kind.to_u8())
    }

    /// Erase every field
    pub fn reset(&mut self) -> StorageResult<()> {
        self.backend.erase_all()
    }

    fn store_timeline(&mut self, timeline: &EventTimeline) -> StorageResult<()> {
        let mut buf: Vec<u8, MAX_VALUE_LEN> = Vec::new();
        for event in timeline.iter() {
            buf.extend_from_slice(&event.as_micros().to_le_bytes())
                .map_err(|_| StorageError::CapacityExceeded { key: KEY_EVENTS })?;
        }
        self.backend.write_blob(KEY_EVENTS, &buf)
    }
}

fn decode_timeline(bytes: &[u8]) -> StorageResult<EventTimeline> {
    if bytes.len() % TIMESTAMP_LEN != 0 {
        return Err(StorageError::Corrupt {
            key: KEY_EVENTS,
            reason: "length not a multiple of 8",
        });
    }

    let mut events: Vec<Timestamp, MAX_EVENTS> = Vec::new();
    for chunk in bytes.chunks_exact(TIMESTAMP_LEN) {
        let mut raw = [0u8; TIMESTAMP_LEN];
        raw.copy_from_slice(chunk);
        events
            .push(Timestamp::from_micros(u64::from_le_bytes(raw)))
            .map_err(|_| StorageError::Corrupt {
                key: KEY_EVENTS,
                reason: "timeline exceeds capacity",
            })?;
    }

    EventTimeline::try_from_timestamps(&events).map_err(|defect| StorageError::Corrupt {
        key: KEY_EVENTS,
        reason: defect.reason(),
    })
}
