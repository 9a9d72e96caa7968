//! Kiosk scan command.
//!
//! Records the raw scan in the access log, then advances the badge's running
//! checkpoint total for the zone and session day and reports goal progress.
//! A session that runs past midnight keeps its session day until it ends.

use std::io::Write;

use anyhow::{Context, Result};
use att_core::{
    BadgeId, CheckpointChange, CompletionMode, EventId, GoalRule, ScanAction, ScanEvent,
    ScheduleBook, ZoneId, checkpoint,
};
use att_db::Database;
use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use crate::commands::util::format_minutes;

/// A single badge read at a kiosk.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub badge: String,
    pub zone: String,
    pub action: ScanAction,
    pub at: DateTime<Utc>,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    book: &ScheduleBook,
    tz: &FixedOffset,
    request: &ScanRequest,
) -> Result<()> {
    let badge = BadgeId::new(request.badge.as_str())?;
    let zone_id = ZoneId::new(request.zone.as_str())?;
    let local = request.at.with_timezone(tz);

    // Until a rolled-over session ends, its zone's scans stay with the day it started.
    let (day_schedule, zone) = match book.carried_over_session(&zone_id, request.at, tz) {
        Some(session) => session,
        None => {
            let today = local.date_naive();
            let day_schedule = book
                .day(today)
                .with_context(|| format!("no sessions are scheduled on {today}"))?;
            let zone = day_schedule
                .zone(&zone_id)
                .with_context(|| format!("zone {zone_id} is not scheduled on {today}"))?;
            (day_schedule, zone)
        }
    };
    let day = day_schedule.date;

    if !db
        .list_registrants()?
        .iter()
        .any(|registrant| registrant.badge == badge)
    {
        tracing::warn!(%badge, "scan from unregistered badge");
    }

    let event = ScanEvent {
        id: EventId::new(Uuid::new_v4().to_string())?,
        timestamp: request.at,
        action: request.action,
        zone: zone_id.clone(),
        badge: badge.clone(),
    };
    db.insert_scans(std::slice::from_ref(&event))?;

    let state = db.load_checkpoint(&badge, &zone_id, day)?;
    let outcome = checkpoint(state, request.action, request.at, &zone.breaks, tz);
    db.save_checkpoint(&badge, &zone_id, day, &outcome.state)?;
    tracing::debug!(?outcome, "checkpoint updated");

    let clock = local.format("%H:%M");
    match outcome.change {
        CheckpointChange::CheckedIn => {
            writeln!(writer, "{badge} checked in to {zone_id} at {clock}")?;
        }
        CheckpointChange::AlreadyInside => {
            let since = state
                .open_entry
                .map(|entry| entry.with_timezone(tz).format("%H:%M").to_string())
                .unwrap_or_default();
            writeln!(
                writer,
                "{badge} is already checked in to {zone_id} since {since}"
            )?;
        }
        CheckpointChange::NotInside => {
            writeln!(
                writer,
                "{badge} is not checked in to {zone_id}, exit ignored"
            )?;
        }
        CheckpointChange::CheckedOut { added_minutes } => {
            writeln!(
                writer,
                "{badge} checked out of {zone_id} at {clock}: +{}",
                format_minutes(added_minutes)
            )?;

            let daily = db.checkpoint_minutes_on(&badge, day)?;
            let overall = db.checkpoint_minutes_total(&badge)?;
            let rule = GoalRule {
                mode: book.completion_mode,
                daily_goal_minutes: day_schedule.goal_minutes(),
                cumulative_goal_minutes: book.cumulative_goal_minutes,
            };

            writeln!(
                writer,
                "Today: {} / {}",
                format_minutes(daily),
                format_minutes(rule.daily_goal_minutes)
            )?;
            match rule.mode {
                CompletionMode::DailySeparate => {
                    writeln!(writer, "Overall: {}", format_minutes(overall))?;
                }
                CompletionMode::Cumulative => writeln!(
                    writer,
                    "Overall: {} / {}",
                    format_minutes(overall),
                    format_minutes(rule.cumulative_goal_minutes)
                )?,
            }
            let status = if rule.is_met(daily, overall) {
                "met"
            } else {
                "not met"
            };
            writeln!(writer, "Goal ({}): {status}", rule.mode)?;
        }
    }

    Ok(())
}
