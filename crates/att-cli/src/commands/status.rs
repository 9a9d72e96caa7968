//! Status command for showing the schedule summary and recent scans by zone.

use std::io::Write;

use anyhow::Result;
use att_core::ScheduleBook;
use att_db::Database;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config, book: &ScheduleBook) -> Result<()> {
    let zones = db.last_scan_by_zone()?;
    let registrants = db.list_registrants()?;

    writeln!(writer, "Attendance tracker status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Schedule: {}", config.schedule_path.display())?;
    writeln!(writer, "Venue offset: {}", config.venue_offset()?)?;
    writeln!(writer, "Completion: {}", book.completion_mode)?;

    let first = book.days.iter().map(|d| d.date).min();
    let last = book.days.iter().map(|d| d.date).max();
    match (first, last) {
        (Some(first), Some(last)) => {
            let zone_count: usize = book.days.iter().map(|d| d.zones.len()).sum();
            writeln!(
                writer,
                "Days: {} ({first} to {last}), {zone_count} zone sessions",
                book.days.len()
            )?;
        }
        _ => writeln!(writer, "Days: none scheduled")?,
    }
    writeln!(writer, "Registrants: {}", registrants.len())?;

    if zones.is_empty() {
        writeln!(writer, "No scans recorded.")?;
        return Ok(());
    }

    writeln!(writer, "Zones:")?;
    for zone in zones {
        writeln!(
            writer,
            "- {}: {} ({} scans)",
            zone.zone, zone.last_scan, zone.scans
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use att_core::CompletionMode;
    use insta::assert_snapshot;

    use crate::commands::report::tests::{conference, seeded_db};

    #[test]
    fn status_command_outputs_last_scan_per_zone() {
        let temp = tempfile::tempdir().unwrap();
        let db = seeded_db();
        let config = Config {
            database_path: temp.path().join("att.db"),
            schedule_path: temp.path().join("schedule.toml"),
            utc_offset: Some("+09:00".to_string()),
        };
        let book = conference(CompletionMode::DailySeparate);

        let mut output = Vec::new();
        run(&mut output, &db, &config, &book).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&temp.path().display().to_string(), "[TEMP]");
        assert_snapshot!(output, @r"
        Attendance tracker status
        Database: [TEMP]/att.db
        Schedule: [TEMP]/schedule.toml
        Venue offset: +09:00
        Completion: DAILY_SEPARATE
        Days: 2 (2025-05-10 to 2025-05-11), 3 zone sessions
        Registrants: 2
        Zones:
        - hall-a: 2025-05-11T05:00:00.000Z (5 scans)
        - hall-b: 2025-05-10T08:40:00.000Z (4 scans)
        ");
    }

    #[test]
    fn status_command_without_scans() {
        let db = Database::open_in_memory().unwrap();
        let config = Config {
            database_path: "/data/att.db".into(),
            schedule_path: "/etc/att/schedule.toml".into(),
            utc_offset: Some("Z".to_string()),
        };

        let mut output = Vec::new();
        run(&mut output, &db, &config, &ScheduleBook::default()).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Attendance tracker status
        Database: /data/att.db
        Schedule: /etc/att/schedule.toml
        Venue offset: +00:00
        Completion: DAILY_SEPARATE
        Days: none scheduled
        Registrants: 0
        No scans recorded.
        ");
    }
}
