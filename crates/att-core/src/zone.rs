//! Zone schedules: per-day session windows, breaks and attendance goals.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::scan::ScanWindow;
use crate::stay::{BreakInterval, SessionBounds};
use crate::types::{ClockTime, ZoneId};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// How a registrant's attendance is judged complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionMode {
    /// Every scheduled day must meet that day's goal on its own.
    #[default]
    DailySeparate,
    /// Minutes from all days are pooled against one cumulative goal.
    Cumulative,
}

impl CompletionMode {
    /// String representation for display and export.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DailySeparate => "DAILY_SEPARATE",
            Self::Cumulative => "CUMULATIVE",
        }
    }
}

impl fmt::Display for CompletionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One zone's program on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSchedule {
    pub id: ZoneId,
    pub name: String,
    /// Official session start (venue wall-clock).
    pub start: ClockTime,
    /// Official session end; earlier than `start` means the next day.
    pub end: ClockTime,
    #[serde(default)]
    pub breaks: Vec<BreakInterval>,
    /// Minutes required in this zone for the zone to count as attended.
    #[serde(default)]
    pub goal_minutes: i64,
}

impl ZoneSchedule {
    /// Whether the session ends on the calendar day after it starts.
    pub fn rolls_over(&self) -> bool {
        self.end < self.start
    }

    /// Scheduled start and end instants of this zone's session on `date`.
    pub fn session_window<Tz: TimeZone>(
        &self,
        date: NaiveDate,
        tz: &Tz,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let end_date = if self.rolls_over() {
            date + Duration::days(1)
        } else {
            date
        };
        (self.start.on(date, tz), self.end.on(end_date, tz))
    }

    /// Session bounds for this zone on `date`.
    ///
    /// While the session is still running (`now` before the scheduled end) the
    /// end bound is `now`, so live dashboards close open visits at the present.
    pub fn session_bounds<Tz: TimeZone>(
        &self,
        date: NaiveDate,
        tz: &Tz,
        now: DateTime<Utc>,
    ) -> SessionBounds {
        let (start, end) = self.session_window(date, tz);
        SessionBounds::new(Some(start), Some(end.min(now)))
    }

    /// Every pair of breaks whose windows overlap.
    ///
    /// The stay-time calculator subtracts each break independently, so an
    /// overlapping pair removes the shared stretch twice.
    pub fn overlapping_breaks(&self) -> Vec<(BreakInterval, BreakInterval)> {
        let mut pairs = Vec::new();
        for (i, a) in self.breaks.iter().enumerate() {
            for b in &self.breaks[i + 1..] {
                let (a_start, a_end) = minute_range(a);
                let (b_start, b_end) = minute_range(b);
                if a_start < b_end && b_start < a_end {
                    pairs.push((*a, *b));
                }
            }
        }
        pairs
    }
}

/// Minutes since midnight for a break, with rollover pushed past 24:00.
fn minute_range(brk: &BreakInterval) -> (u32, u32) {
    let to_minutes = |t: ClockTime| t.time().hour() * 60 + t.time().minute();
    let start = to_minutes(brk.start);
    let mut end = to_minutes(brk.end);
    if brk.rolls_over() {
        end += MINUTES_PER_DAY;
    }
    (start, end)
}

/// All zones scheduled on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    /// Daily goal across all zones. When absent, the zone goals are summed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_goal_minutes: Option<i64>,
    #[serde(default)]
    pub zones: Vec<ZoneSchedule>,
}

impl DaySchedule {
    /// The minutes a registrant needs across all zones on this day.
    pub fn goal_minutes(&self) -> i64 {
        self.global_goal_minutes
            .unwrap_or_else(|| self.zones.iter().map(|z| z.goal_minutes).sum())
    }

    pub fn zone(&self, id: &ZoneId) -> Option<&ZoneSchedule> {
        self.zones.iter().find(|z| &z.id == id)
    }
}

/// The full conference schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBook {
    #[serde(default)]
    pub completion_mode: CompletionMode,
    /// Goal used in [`CompletionMode::Cumulative`].
    #[serde(default)]
    pub cumulative_goal_minutes: i64,
    #[serde(default)]
    pub days: Vec<DaySchedule>,
}

impl ScheduleBook {
    pub fn day(&self, date: NaiveDate) -> Option<&DaySchedule> {
        self.days.iter().find(|d| d.date == date)
    }

    pub fn zone(&self, date: NaiveDate, id: &ZoneId) -> Option<&ZoneSchedule> {
        self.day(date).and_then(|d| d.zone(id))
    }

    /// The scans that belong to `zone`'s session on `date`.
    ///
    /// A session owns its venue calendar day, extended past midnight when it
    /// rolls over. The early hours claimed by the previous day's rolled-over
    /// session of the same zone are left to that session.
    pub fn scan_window<Tz: TimeZone>(
        &self,
        date: NaiveDate,
        zone: &ZoneSchedule,
        tz: &Tz,
    ) -> ScanWindow {
        let previous_day = date - Duration::days(1);
        let mut from = ClockTime::MIDNIGHT.on(date, tz);
        if let Some(previous) = self.zone(previous_day, &zone.id).filter(|z| z.rolls_over()) {
            let (_, previous_end) = previous.session_window(previous_day, tz);
            from = from.max(previous_end);
        }

        let mut until = ClockTime::MIDNIGHT.on(date + Duration::days(1), tz);
        if zone.rolls_over() {
            let (_, end) = zone.session_window(date, tz);
            until = until.max(end);
        }
        ScanWindow { from, until }
    }

    /// The previous day's session of `zone` when it rolls over and is still
    /// scheduled to run at `at`.
    pub fn carried_over_session<Tz: TimeZone>(
        &self,
        zone: &ZoneId,
        at: DateTime<Utc>,
        tz: &Tz,
    ) -> Option<(&DaySchedule, &ZoneSchedule)> {
        let previous = at.with_timezone(tz).date_naive() - Duration::days(1);
        let day = self.day(previous)?;
        let session = day.zone(zone)?;
        if !session.rolls_over() {
            return None;
        }
        let (_, end) = session.session_window(previous, tz);
        (at <= end).then_some((day, session))
    }

    /// Configuration problems that do not stop calculation but skew results.
    pub fn validate(&self) -> Vec<ScheduleWarning> {
        let mut warnings = Vec::new();
        let mut seen_days = HashSet::new();

        for day in &self.days {
            if !seen_days.insert(day.date) {
                warnings.push(ScheduleWarning::DuplicateDay { date: day.date });
            }

            let mut seen_zones = HashSet::new();
            for zone in &day.zones {
                if !seen_zones.insert(&zone.id) {
                    warnings.push(ScheduleWarning::DuplicateZone {
                        date: day.date,
                        zone: zone.id.clone(),
                    });
                }
                if zone.start == zone.end {
                    warnings.push(ScheduleWarning::EmptySession {
                        date: day.date,
                        zone: zone.id.clone(),
                    });
                }
                for brk in zone.breaks.iter().filter(|b| b.start == b.end) {
                    warnings.push(ScheduleWarning::ZeroLengthBreak {
                        date: day.date,
                        zone: zone.id.clone(),
                        at: brk.start,
                    });
                }
                for (first, second) in zone.overlapping_breaks() {
                    warnings.push(ScheduleWarning::OverlappingBreaks {
                        date: day.date,
                        zone: zone.id.clone(),
                        first,
                        second,
                    });
                }
            }
        }

        if self.completion_mode == CompletionMode::Cumulative && self.cumulative_goal_minutes <= 0 {
            warnings.push(ScheduleWarning::MissingCumulativeGoal);
        }

        warnings
    }
}

/// A schedule configuration smell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleWarning {
    DuplicateDay {
        date: NaiveDate,
    },
    DuplicateZone {
        date: NaiveDate,
        zone: ZoneId,
    },
    EmptySession {
        date: NaiveDate,
        zone: ZoneId,
    },
    ZeroLengthBreak {
        date: NaiveDate,
        zone: ZoneId,
        at: ClockTime,
    },
    /// Both breaks are subtracted in full, so the overlap is removed twice.
    OverlappingBreaks {
        date: NaiveDate,
        zone: ZoneId,
        first: BreakInterval,
        second: BreakInterval,
    },
    MissingCumulativeGoal,
}

impl fmt::Display for ScheduleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateDay { date } => write!(f, "{date}: day is configured more than once"),
            Self::DuplicateZone { date, zone } => {
                write!(f, "{date} {zone}: zone is configured more than once")
            }
            Self::EmptySession { date, zone } => {
                write!(f, "{date} {zone}: session start equals session end")
            }
            Self::ZeroLengthBreak { date, zone, at } => {
                write!(f, "{date} {zone}: break at {at} has zero length")
            }
            Self::OverlappingBreaks {
                date,
                zone,
                first,
                second,
            } => write!(
                f,
                "{date} {zone}: breaks {}-{} and {}-{} overlap; the shared time is subtracted twice",
                first.start, first.end, second.start, second.end
            ),
            Self::MissingCumulativeGoal => {
                write!(f, "cumulative completion mode without a positive cumulative goal")
            }
        }
    }
}
