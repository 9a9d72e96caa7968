//! Per-registrant attendance statistics and completion.
//!
//! The reporter runs the stay-time calculator once per registrant, zone and
//! day, sums zone minutes into daily totals and compares them with the
//! configured goals.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::scan::{ScanEvent, ScanLike, filter_scans};
use crate::stay::compute_stay_minutes;
use crate::types::{BadgeId, ZoneId};
use crate::zone::{CompletionMode, DaySchedule, ScheduleBook, ZoneSchedule};

/// A conference attendee identified by badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrant {
    pub badge: BadgeId,
    pub name: String,
}

/// Minutes in one zone on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneAttendance {
    pub zone: ZoneId,
    pub zone_name: String,
    pub minutes: i64,
    pub goal_minutes: i64,
    pub goal_met: bool,
}

/// All zones for one registrant on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyAttendance {
    pub date: NaiveDate,
    pub zones: Vec<ZoneAttendance>,
    pub total_minutes: i64,
    pub goal_minutes: i64,
    pub goal_met: bool,
}

/// One registrant across the whole schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrantAttendance {
    pub badge: BadgeId,
    pub name: String,
    pub days: Vec<DailyAttendance>,
    pub total_minutes: i64,
    pub completed: bool,
}

/// Headline counts for a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub registrants: usize,
    /// Registrants with any counted minutes.
    pub attended: usize,
    pub completed: usize,
}

/// Attendance for every registrant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceReport {
    pub generated_at: DateTime<Utc>,
    pub completion_mode: CompletionMode,
    pub cumulative_goal_minutes: i64,
    pub registrants: Vec<RegistrantAttendance>,
    pub summary: ReportSummary,
}

/// Counted minutes for one person's scans at `zone` on `date`.
///
/// `events` should already be narrowed to the person, zone and session.
pub fn zone_minutes<E: ScanLike, Tz: TimeZone>(
    events: &[E],
    zone: &ZoneSchedule,
    date: NaiveDate,
    tz: &Tz,
    now: DateTime<Utc>,
) -> i64 {
    let bounds = zone.session_bounds(date, tz, now);
    compute_stay_minutes(events, &zone.breaks, &bounds, tz)
}

/// One registrant's attendance for one scheduled day.
///
/// `scans` are that registrant's scans in any zone on any day. Each zone takes
/// the scans inside its [`ScheduleBook::scan_window`], so a session that runs
/// past midnight keeps its after-midnight exits.
pub fn daily_attendance<Tz: TimeZone>(
    badge: &BadgeId,
    scans: &[&ScanEvent],
    book: &ScheduleBook,
    day: &DaySchedule,
    tz: &Tz,
    now: DateTime<Utc>,
) -> DailyAttendance {
    let zones: Vec<ZoneAttendance> = day
        .zones
        .iter()
        .map(|zone| {
            let window = book.scan_window(day.date, zone, tz);
            let zone_scans = filter_scans(scans.iter().copied(), badge, &zone.id, window);
            let minutes = zone_minutes(&zone_scans, zone, day.date, tz, now);
            ZoneAttendance {
                zone: zone.id.clone(),
                zone_name: zone.name.clone(),
                minutes,
                goal_minutes: zone.goal_minutes,
                goal_met: minutes >= zone.goal_minutes,
            }
        })
        .collect();

    let total_minutes = zones.iter().map(|z| z.minutes).sum();
    let goal_minutes = day.goal_minutes();
    DailyAttendance {
        date: day.date,
        zones,
        total_minutes,
        goal_minutes,
        goal_met: total_minutes >= goal_minutes,
    }
}

/// Whether a registrant has completed attendance under `book`'s rules.
///
/// Daily mode needs at least one scheduled day and every day's goal met.
pub fn is_completed(book: &ScheduleBook, days: &[DailyAttendance]) -> bool {
    match book.completion_mode {
        CompletionMode::DailySeparate => !days.is_empty() && days.iter().all(|d| d.goal_met),
        CompletionMode::Cumulative => {
            let total: i64 = days.iter().map(|d| d.total_minutes).sum();
            total >= book.cumulative_goal_minutes
        }
    }
}

/// Builds the attendance report for all registrants.
///
/// Registrants are computed in parallel and returned ordered by badge. Scans
/// from unregistered badges are ignored.
pub fn build_report<Tz: TimeZone + Sync>(
    registrants: &[Registrant],
    scans: &[ScanEvent],
    book: &ScheduleBook,
    tz: &Tz,
    now: DateTime<Utc>,
) -> AttendanceReport {
    let mut by_badge: HashMap<&BadgeId, Vec<&ScanEvent>> = HashMap::new();
    for scan in scans {
        by_badge.entry(&scan.badge).or_default().push(scan);
    }

    let mut ordered: Vec<&Registrant> = registrants.iter().collect();
    ordered.sort_by(|a, b| a.badge.cmp(&b.badge));

    let rows: Vec<RegistrantAttendance> = ordered
        .par_iter()
        .map(|registrant| {
            let own = by_badge.get(&registrant.badge).map_or(&[][..], Vec::as_slice);
            let days: Vec<DailyAttendance> = book
                .days
                .iter()
                .map(|day| daily_attendance(&registrant.badge, own, book, day, tz, now))
                .collect();
            let total_minutes = days.iter().map(|d| d.total_minutes).sum();
            let completed = is_completed(book, &days);
            RegistrantAttendance {
                badge: registrant.badge.clone(),
                name: registrant.name.clone(),
                days,
                total_minutes,
                completed,
            }
        })
        .collect();

    let summary = ReportSummary {
        registrants: rows.len(),
        attended: rows.iter().filter(|r| r.total_minutes > 0).count(),
        completed: rows.iter().filter(|r| r.completed).count(),
    };

    AttendanceReport {
        generated_at: now,
        completion_mode: book.completion_mode,
        cumulative_goal_minutes: book.cumulative_goal_minutes,
        registrants: rows,
        summary,
    }
}
