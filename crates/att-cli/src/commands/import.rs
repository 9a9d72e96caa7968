//! Import command for loading access logs into the local `SQLite` store.

use std::io::BufRead;

use anyhow::{Context, Result};
use att_core::{BadgeId, EventId, ScanAction, ScanEvent, ZoneId};
use att_db::Database;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Deserialize;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Zone to apply when incoming scans omit `zone`.
    #[arg(long)]
    pub zone: Option<String>,
}

/// Reads JSONL scans from `reader` and stores them, returning the number of new rows.
pub fn run<R: BufRead>(reader: R, args: &ImportArgs, db: &mut Database) -> Result<usize> {
    let scans = parse_scans(reader, args.zone.as_deref())?;
    let inserted = db.insert_scans(&scans)?;
    tracing::debug!(parsed = scans.len(), inserted, "import finished");
    Ok(inserted)
}

fn parse_scans<R: BufRead>(reader: R, default_zone: Option<&str>) -> Result<Vec<ScanEvent>> {
    let mut scans = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed: ImportScan = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        let scan = parsed
            .into_scan(default_zone)
            .with_context(|| format!("invalid scan on line {}", idx + 1))?;
        scans.push(scan);
    }
    Ok(scans)
}

/// One access-log line. Dashboard exports name the zone `locationId` and the
/// badge `scannedQr`; both spellings are accepted.
#[derive(Debug, Deserialize)]
struct ImportScan {
    id: String,
    timestamp: String,
    action: String,
    #[serde(default, alias = "locationId")]
    zone: Option<String>,
    #[serde(alias = "scannedQr")]
    badge: String,
}

impl ImportScan {
    fn into_scan(self, default_zone: Option<&str>) -> Result<ScanEvent> {
        let zone = match self.zone {
            Some(zone) if !zone.trim().is_empty() => zone,
            _ => default_zone
                .map(str::to_string)
                .filter(|val| !val.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing zone"))?,
        };
        let timestamp = DateTime::parse_from_rfc3339(self.timestamp.trim())
            .with_context(|| format!("invalid timestamp {:?}", self.timestamp))?
            .with_timezone(&Utc);
        let action: ScanAction = self.action.trim().parse()?;
        Ok(ScanEvent {
            id: EventId::new(self.id)?,
            timestamp,
            action,
            zone: ZoneId::new(zone)?,
            badge: BadgeId::new(self.badge)?,
        })
    }
}
