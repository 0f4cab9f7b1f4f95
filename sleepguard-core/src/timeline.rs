//! Event Timeline Generation
//!
//! At first power-on the node draws its whole experiment up front: the
//! window `[start, start + duration)` is split into `event_count` equal
//! segments and one event instant is drawn inside each.
//!
//! ## Placement
//!
//! Battery reports fire on the grid `start + k * period`. Events are drawn
//! from the shifted grid `start + m * period + guard_offset`, restricted to
//! slots that fall inside the segment. Every event therefore sits
//! `guard_offset` after one battery instant and `period - guard_offset`
//! before the next, and the two report kinds never contend for the radio.
//!
//! A segment narrower than the battery period may hold no such slot. It
//! then gets a uniformly drawn second shifted by `guard_offset`, kept
//! inside the segment, and the guard window is not guaranteed for it.
//!
//! Segment `i` covers `[i * width, (i + 1) * width)` seconds from the start,
//! with `width = floor(duration / event_count)`. Since segments are disjoint
//! and ordered, the timeline is strictly increasing by construction.
//!
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//! use sleepguard_core::{timeline, ScheduleConfig, Timestamp};
//!
//! let config = ScheduleConfig::default();
//! let start = Timestamp::from_secs(1_000);
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! let events = timeline::generate(start, &config, &mut rng).unwrap();
//! assert_eq!(events.len(), config.event_count);
//! ```

use core::slice;

use heapless::Vec;
use rand_core::RngCore;

use crate::config::ScheduleConfig;
use crate::constants::schedule::MAX_EVENTS;
use crate::constants::time::SECONDS_PER_MINUTE;
use crate::errors::{ConfigError, ConfigResult};
use crate::time::Timestamp;

/// Why a sequence of instants is not a valid timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineDefect {
    /// No events
    Empty,
    /// More events than [`MAX_EVENTS`]
    Overfull,
    /// Events not strictly increasing
    OutOfOrder,
}

impl TimelineDefect {
    /// Short description for error reporting
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Empty => "empty timeline",
            Self::Overfull => "timeline exceeds capacity",
            Self::OutOfOrder => "timeline not strictly increasing",
        }
    }
}

/// Ordered, non-empty list of absolute event instants
///
/// Immutable once built. Only the cursor into it changes between wakes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTimeline {
    events: Vec<Timestamp, MAX_EVENTS>,
}

impl EventTimeline {
    /// Rebuild a timeline from persisted instants
    pub fn try_from_timestamps(events: &[Timestamp]) -> Result<Self, TimelineDefect> {
        if events.is_empty() {
            return Err(TimelineDefect::Empty);
        }

        if events.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(TimelineDefect::OutOfOrder);
        }

        let events = Vec::from_slice(events).map_err(|_| TimelineDefect::Overfull)?;
        Ok(Self { events })
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always `false` for a constructed timeline
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event at `index`, `None` past the end
    pub fn get(&self, index: usize) -> Option<Timestamp> {
        self.events.get(index).copied()
    }

    /// First event
    pub fn first(&self) -> Option<Timestamp> {
        self.events.first().copied()
    }

    /// Last event
    pub fn last(&self) -> Option<Timestamp> {
        self.events.last().copied()
    }

    /// Events in order
    pub fn iter(&self) -> core::iter::Copied<slice::Iter<'_, Timestamp>> {
        self.events.iter().copied()
    }

    /// Events as a slice
    pub fn as_slice(&self) -> &[Timestamp] {
        &self.events
    }

    /// Log each event's offset from `start` in whole minutes
    pub fn log_summary(&self, start: Timestamp) {
        for (index, event) in self.iter().enumerate() {
            let offset_secs = event.as_secs().saturating_sub(start.as_secs());
            log_info!(
                "event {}: +{} min ({}s)",
                index,
                offset_secs / SECONDS_PER_MINUTE,
                offset_secs
            );
        }
    }
}

/// Draw a timeline for an experiment beginning at `start`
///
/// Fails without drawing anything if the configuration is invalid or the
/// window runs past the end of the timestamp range.
pub fn generate<R>(
    start: Timestamp,
    config: &ScheduleConfig,
    rng: &mut R,
) -> ConfigResult<EventTimeline>
where
    R: RngCore + ?Sized,
{
    config.validate()?;

    start
        .checked_add_secs(config.experiment_duration_secs)
        .ok_or(ConfigError::HorizonOverflow)?;

    let width = config.segment_width_secs();
    let period = config.battery_period_secs;
    let guard = config.guard_offset_secs;

    let mut events = Vec::new();
    for segment in 0..config.event_count as u64 {
        let lower = segment * width;
        let upper = lower + width;

        let offset = place_in_segment(lower, upper, period, guard, rng.next_u32());
        let event = start
            .checked_add_secs(offset)
            .ok_or(ConfigError::HorizonOverflow)?;

        events
            .push(event)
            .map_err(|_| ConfigError::TooManyEvents {
                requested: config.event_count,
                max: MAX_EVENTS,
            })?;
    }

    Ok(EventTimeline { events })
}

/// Offset in `[lower, upper)` for one event, given one random draw
///
/// Prefers a guarded battery slot. A segment too short to hold one gets a
/// uniform second shifted by `guard`, or unshifted when the shift would
/// leave the segment.
fn place_in_segment(lower: u64, upper: u64, period: u64, guard: u64, draw: u32) -> u64 {
    let draw = u64::from(draw);
    let first_slot = slot_at_or_after(lower, period, guard);
    let end_slot = slot_at_or_after(upper, period, guard);

    if end_slot > first_slot {
        let slot = first_slot + draw % (end_slot - first_slot);
        return slot * period + guard;
    }

    let width = upper - lower;
    match width.checked_sub(guard) {
        Some(span) if span > 0 => lower + draw % span + guard,
        _ => lower + draw % width,
    }
}

/// Smallest `m` with `m * period + guard >= offset`
fn slot_at_or_after(offset: u64, period: u64, guard: u64) -> u64 {
    if offset <= guard {
        0
    } else {
        (offset - guard).div_ceil(period)
    }
}
