//! Report command for per-registrant attendance and completion.
//!
//! Implements `att report` with an optional single-day filter and two output
//! formats (human-readable, JSON). Completion is always judged over the whole
//! schedule; `--date` only narrows which days are displayed.

use std::io::Write;

use anyhow::{Result, bail};
use att_core::{
    AttendanceReport, ClockTime, CompletionMode, ScanEvent, ScheduleBook, build_report,
};
use att_db::Database;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::commands::util::format_minutes;

/// Loads the scans that can fall on any scheduled venue day.
///
/// The window runs from midnight of the first day to two days past the last,
/// which covers sessions that end after midnight.
pub fn scans_for_schedule(
    db: &Database,
    book: &ScheduleBook,
    tz: &FixedOffset,
) -> Result<Vec<ScanEvent>> {
    let (Some(first), Some(last)) = (
        book.days.iter().map(|d| d.date).min(),
        book.days.iter().map(|d| d.date).max(),
    ) else {
        return Ok(Vec::new());
    };
    let start = ClockTime::MIDNIGHT.on(first, tz);
    let end = ClockTime::MIDNIGHT.on(last + Duration::days(2), tz);
    Ok(db.list_scans_in_range(start, end)?)
}

/// Computes the report, keeping only `date` in each registrant's day list when given.
pub fn build(
    db: &Database,
    book: &ScheduleBook,
    tz: &FixedOffset,
    now: DateTime<Utc>,
    date: Option<NaiveDate>,
) -> Result<AttendanceReport> {
    if let Some(date) = date.filter(|d| book.day(*d).is_none()) {
        bail!("no sessions are scheduled on {date}");
    }

    let registrants = db.list_registrants()?;
    let scans = scans_for_schedule(db, book, tz)?;
    tracing::debug!(
        registrants = registrants.len(),
        scans = scans.len(),
        "building attendance report"
    );
    let mut report = build_report(&registrants, &scans, book, tz, now);

    if let Some(date) = date {
        for registrant in &mut report.registrants {
            registrant.days.retain(|day| day.date == date);
        }
    }
    Ok(report)
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    book: &ScheduleBook,
    tz: &FixedOffset,
    now: DateTime<Utc>,
    date: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let report = build(db, book, tz, now, date)?;
    if json {
        writeln!(writer, "{}", format_report_json(&report, tz)?)?;
    } else {
        format_report(writer, &report, tz, book.days.is_empty())?;
    }
    Ok(())
}

/// Writes the human-readable report.
pub fn format_report<W: Write>(
    writer: &mut W,
    report: &AttendanceReport,
    tz: &FixedOffset,
    no_sessions: bool,
) -> Result<()> {
    match report.completion_mode {
        CompletionMode::DailySeparate => {
            writeln!(writer, "ATTENDANCE REPORT ({})", report.completion_mode)?;
        }
        CompletionMode::Cumulative => writeln!(
            writer,
            "ATTENDANCE REPORT ({}, goal {})",
            report.completion_mode,
            format_minutes(report.cumulative_goal_minutes)
        )?,
    }
    writeln!(
        writer,
        "Generated: {}",
        report.generated_at.with_timezone(tz).format("%Y-%m-%d %H:%M %:z")
    )?;

    if no_sessions {
        writeln!(writer)?;
        writeln!(writer, "No sessions scheduled.")?;
        writeln!(writer)?;
        writeln!(writer, "Hint: Run 'att zones list' to check the schedule file.")?;
        return Ok(());
    }
    if report.registrants.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "No registrants.")?;
        writeln!(writer)?;
        writeln!(
            writer,
            "Hint: Run 'att register --badge <QR> --name <NAME>' to add one."
        )?;
        return Ok(());
    }

    for registrant in &report.registrants {
        writeln!(writer)?;
        writeln!(writer, "{}  {}", registrant.badge, registrant.name)?;
        for day in &registrant.days {
            writeln!(
                writer,
                "  {}  {} / {}  {}",
                day.date,
                format_minutes(day.total_minutes),
                format_minutes(day.goal_minutes),
                met_label(day.goal_met)
            )?;
            for zone in &day.zones {
                writeln!(
                    writer,
                    "    {}: {} / {}",
                    zone.zone_name,
                    format_minutes(zone.minutes),
                    format_minutes(zone.goal_minutes)
                )?;
            }
        }
        let completion = if registrant.completed {
            "completed"
        } else {
            "not completed"
        };
        writeln!(
            writer,
            "  Overall: {}  {completion}",
            format_minutes(registrant.total_minutes)
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "SUMMARY")?;
    writeln!(writer, "───────")?;
    writeln!(writer, "Registrants: {}", report.summary.registrants)?;
    writeln!(writer, "Attended:    {}", report.summary.attended)?;
    writeln!(writer, "Completed:   {}", report.summary.completed)?;
    Ok(())
}

const fn met_label(met: bool) -> &'static str {
    if met { "met" } else { "not met" }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    timezone: String,
    #[serde(flatten)]
    report: &'a AttendanceReport,
}

/// Formats the report as JSON.
pub fn format_report_json(report: &AttendanceReport, tz: &FixedOffset) -> Result<String> {
    let json = JsonReport {
        timezone: tz.to_string(),
        report,
    };
    Ok(serde_json::to_string_pretty(&json)?)
}
