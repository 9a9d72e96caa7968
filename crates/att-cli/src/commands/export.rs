//! Export command for per-zone attendance statistics as CSV.
//!
//! One row per registrant, scheduled day and zone, with the day's totals and
//! the registrant's completion repeated on each row so spreadsheets can
//! filter without joins.

use std::io::Write;

use anyhow::Result;
use att_core::ScheduleBook;
use att_db::Database;
use chrono::{DateTime, FixedOffset, Utc};

use crate::commands::report;

const HEADER: &str = "badge,name,date,zone,zone_name,minutes,goal_minutes,goal_met,\
daily_minutes,daily_goal_minutes,daily_goal_met,completed";

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    book: &ScheduleBook,
    tz: &FixedOffset,
    now: DateTime<Utc>,
) -> Result<usize> {
    let report = report::build(db, book, tz, now, None)?;
    writeln!(writer, "{HEADER}")?;

    let mut rows = 0;
    for registrant in &report.registrants {
        for day in &registrant.days {
            for zone in &day.zones {
                let fields = [
                    csv_field(registrant.badge.as_str()),
                    csv_field(&registrant.name),
                    day.date.to_string(),
                    csv_field(zone.zone.as_str()),
                    csv_field(&zone.zone_name),
                    zone.minutes.to_string(),
                    zone.goal_minutes.to_string(),
                    zone.goal_met.to_string(),
                    day.total_minutes.to_string(),
                    day.goal_minutes.to_string(),
                    day.goal_met.to_string(),
                    registrant.completed.to_string(),
                ];
                writeln!(writer, "{}", fields.join(","))?;
                rows += 1;
            }
        }
    }
    Ok(rows)
}

/// Quotes a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
