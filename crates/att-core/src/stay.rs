//! Stay-time calculation.
//!
//! Turns a person's entry/exit scans at one zone into the number of minutes
//! they were present, excluding configured breaks and clipping to the zone's
//! session window.
//!
//! # Algorithm Summary
//!
//! 1. Sort a copy of the scans by timestamp
//! 2. Pair scans into segments: the first ENTRY of a run opens a segment, the
//!    next EXIT closes it; repeated ENTRYs and unmatched EXITs are absorbed
//! 3. A segment still open at the end closes at the session end, if one is
//!    given and lies after the entry; otherwise it is dropped
//! 4. Each segment is clipped to the session bounds, then every break overlap
//!    is subtracted and the result clamped at zero
//! 5. Segment durations are summed and floored to whole minutes once
//!
//! Scan hardware produces duplicate and out-of-order reads, so nothing here
//! rejects input. Callers that need to tell "absent" from "garbage" must look
//! at the raw scans themselves.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::scan::{ScanAction, ScanLike};
use crate::types::ClockTime;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// A recurring time-of-day window (lunch, keynote changeover) excluded from
/// counted attendance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakInterval {
    pub start: ClockTime,
    /// When earlier than `start`, the break ends on the following day.
    pub end: ClockTime,
}

impl BreakInterval {
    pub const fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    /// Whether the break crosses midnight.
    pub fn rolls_over(&self) -> bool {
        self.end < self.start
    }

    /// The absolute window of this break on `date` in `tz`.
    pub fn window_on<Tz: TimeZone>(&self, date: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start.on(date, tz);
        let end_date = if self.rolls_over() {
            date + Duration::days(1)
        } else {
            date
        };
        (start, self.end.on(end_date, tz))
    }
}

/// Optional clipping window for counted time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionBounds {
    /// Time before this instant is not counted.
    pub start: Option<DateTime<Utc>>,
    /// Time after this instant is not counted; also closes a dangling entry.
    pub end: Option<DateTime<Utc>>,
}

impl SessionBounds {
    /// No clipping on either side.
    pub const UNBOUNDED: Self = Self {
        start: None,
        end: None,
    };

    pub const fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }
}

/// One matched visit: an ENTRY and whatever closed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub entry: DateTime<Utc>,
    /// The EXIT scan, or the session end for a visit left open.
    pub exit: DateTime<Utc>,
}

/// Pairs scans into segments.
///
/// First entry wins for a run of ENTRYs; an EXIT with nothing open is ignored.
/// A trailing open entry becomes a segment only when `session_end` is strictly
/// after it.
pub fn pair_segments<E: ScanLike>(events: &[E], session_end: Option<DateTime<Utc>>) -> Vec<Segment> {
    let mut scans: Vec<(DateTime<Utc>, ScanAction)> =
        events.iter().map(|e| (e.timestamp(), e.action())).collect();
    // Stable: scans sharing a timestamp keep their recorded order.
    scans.sort_by_key(|(timestamp, _)| *timestamp);

    let mut segments = Vec::new();
    let mut open_entry: Option<DateTime<Utc>> = None;

    for (timestamp, action) in scans {
        match action {
            ScanAction::Entry => {
                if open_entry.is_none() {
                    open_entry = Some(timestamp);
                }
            }
            ScanAction::Exit => {
                if let Some(entry) = open_entry.take() {
                    segments.push(Segment { entry, exit: timestamp });
                }
            }
        }
    }

    if let (Some(entry), Some(end)) = (open_entry, session_end) {
        if end > entry {
            segments.push(Segment { entry, exit: end });
        }
    }

    segments
}

/// Counted milliseconds for one segment.
///
/// The segment is clipped to `bounds`; each break is anchored to the venue
/// calendar day of the unclipped `entry` and its overlap subtracted. Breaks
/// that overlap each other are each subtracted in full. Never negative.
pub fn segment_millis<Tz: TimeZone>(
    entry: DateTime<Utc>,
    exit: DateTime<Utc>,
    breaks: &[BreakInterval],
    bounds: &SessionBounds,
    tz: &Tz,
) -> i64 {
    let start = match bounds.start {
        Some(session_start) if entry < session_start => session_start,
        _ => entry,
    };
    let end = match bounds.end {
        Some(session_end) if exit > session_end => session_end,
        _ => exit,
    };
    if start >= end {
        return 0;
    }

    let day = entry.with_timezone(tz).date_naive();
    let mut millis = (end - start).num_milliseconds();
    for brk in breaks {
        let (break_start, break_end) = brk.window_on(day, tz);
        millis -= overlap_millis(start, end, break_start, break_end);
    }
    millis.max(0)
}

/// Total counted minutes for one person at one zone.
///
/// `events` need not be sorted and are not modified. Fractional minutes from
/// each segment accumulate; the total is floored once.
pub fn compute_stay_minutes<E: ScanLike, Tz: TimeZone>(
    events: &[E],
    breaks: &[BreakInterval],
    bounds: &SessionBounds,
    tz: &Tz,
) -> i64 {
    let total_millis: i64 = pair_segments(events, bounds.end)
        .iter()
        .map(|segment| segment_millis(segment.entry, segment.exit, breaks, bounds, tz))
        .sum();
    floor_minutes(total_millis)
}

/// Whole minutes in a millisecond span, rounding down.
pub const fn floor_minutes(millis: i64) -> i64 {
    millis.div_euclid(MILLIS_PER_MINUTE)
}

fn overlap_millis(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> i64 {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    if end > start {
        (end - start).num_milliseconds()
    } else {
        0
    }
}
