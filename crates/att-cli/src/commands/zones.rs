//! Zone schedule inspection: listing and validation.

use std::io::Write;

use anyhow::Result;
use att_core::ScheduleBook;

use crate::commands::util::format_minutes;

pub fn list<W: Write>(writer: &mut W, book: &ScheduleBook) -> Result<()> {
    if book.days.is_empty() {
        writeln!(writer, "No sessions scheduled.")?;
        return Ok(());
    }

    for (idx, day) in book.days.iter().enumerate() {
        if idx > 0 {
            writeln!(writer)?;
        }
        writeln!(
            writer,
            "{} (daily goal {})",
            day.date,
            format_minutes(day.goal_minutes())
        )?;
        for zone in &day.zones {
            let mut line = format!(
                "  {}  {}  {}-{}  goal {}",
                zone.id,
                zone.name,
                zone.start,
                zone.end,
                format_minutes(zone.goal_minutes)
            );
            if !zone.breaks.is_empty() {
                let breaks: Vec<String> = zone
                    .breaks
                    .iter()
                    .map(|b| format!("{}-{}", b.start, b.end))
                    .collect();
                line.push_str(&format!("  breaks {}", breaks.join(", ")));
            }
            writeln!(writer, "{line}")?;
        }
    }
    Ok(())
}

/// Prints schedule warnings and returns how many were found.
pub fn check<W: Write>(writer: &mut W, book: &ScheduleBook) -> Result<usize> {
    let warnings = book.validate();
    if warnings.is_empty() {
        let zones: usize = book.days.iter().map(|d| d.zones.len()).sum();
        writeln!(
            writer,
            "Schedule OK: {} days, {zones} zone sessions",
            book.days.len()
        )?;
        return Ok(0);
    }

    for warning in &warnings {
        writeln!(writer, "warning: {warning}")?;
    }
    Ok(warnings.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    use att_core::{BreakInterval, CompletionMode};
    use insta::assert_snapshot;

    use crate::commands::report::tests::conference;

    #[test]
    fn list_shows_days_zones_and_breaks() {
        let book = conference(CompletionMode::DailySeparate);
        let mut output = Vec::new();
        list(&mut output, &book).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        2025-05-10 (daily goal 7h 0m)
          hall-a  Hall A  09:00-18:00  goal 4h 0m  breaks 12:00-13:00
          hall-b  Hall B  09:00-18:00  goal 3h 0m

        2025-05-11 (daily goal 4h 0m)
          hall-a  Hall A  09:00-18:00  goal 4h 0m  breaks 12:00-13:00
        ");
    }

    #[test]
    fn check_passes_clean_schedule() {
        let book = conference(CompletionMode::DailySeparate);
        let mut output = Vec::new();
        assert_eq!(check(&mut output, &book).unwrap(), 0);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Schedule OK: 2 days, 3 zone sessions\n"
        );
    }

    #[test]
    fn check_reports_overlapping_breaks() {
        let mut book = conference(CompletionMode::Cumulative);
        book.cumulative_goal_minutes = 0;
        book.days[0].zones[0].breaks.push(BreakInterval::new(
            "12:30".parse().unwrap(),
            "14:00".parse().unwrap(),
        ));

        let mut output = Vec::new();
        assert_eq!(check(&mut output, &book).unwrap(), 2);

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        warning: 2025-05-10 hall-a: breaks 12:00-13:00 and 12:30-14:00 overlap; the shared time is subtracted twice
        warning: cumulative completion mode without a positive cumulative goal
        ");
    }
}
