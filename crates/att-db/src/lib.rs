//! Storage layer for attendance tracking.
//!
//! Provides persistence for registrants, checkpoint scans and kiosk running
//! totals using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in ISO 8601 UTC with millisecond precision
//! (e.g., `2025-05-10T00:30:00.000Z`), so lexicographic ordering matches
//! chronological ordering.
//!
//! ## Scan Actions
//!
//! The `action` column holds `ENTRY` or `EXIT`. Rows are never updated; a
//! duplicate read from the scanner is a separate row and is absorbed later by
//! the stay-time calculator.

use std::path::Path;

use att_core::{
    BadgeId, CheckpointState, EventId, Registrant, ScanAction, ScanEvent, ValidationError, ZoneId,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {record}: {timestamp}")]
    TimestampParse {
        record: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row no longer satisfies the domain types.
    #[error("invalid stored record {record}: {message}")]
    InvalidRecord { record: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Most recent scan seen by each zone's checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneLastScan {
    pub zone: String,
    pub last_scan: String,
    pub scans: i64,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS registrants (
                badge TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- Access log: one row per badge read at a zone checkpoint
            -- timestamp: ISO 8601 UTC (e.g., '2025-05-10T00:30:00.000Z')
            -- action: 'ENTRY' or 'EXIT'
            CREATE TABLE IF NOT EXISTS access_logs (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                action TEXT NOT NULL,
                zone TEXT NOT NULL,
                badge TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_access_logs_timestamp ON access_logs(timestamp);
            CREATE INDEX IF NOT EXISTS idx_access_logs_badge_zone ON access_logs(badge, zone);

            -- Kiosk running totals per badge, zone and venue day (YYYY-MM-DD)
            CREATE TABLE IF NOT EXISTS checkpoints (
                badge TEXT NOT NULL,
                zone TEXT NOT NULL,
                day TEXT NOT NULL,
                open_entry TEXT,
                total_minutes INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (badge, zone, day)
            );
            ",
        )?;
        Ok(())
    }

    /// Adds a registrant or renames an existing one.
    pub fn upsert_registrant(&mut self, registrant: &Registrant) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO registrants (badge, name, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(badge) DO UPDATE SET name = excluded.name
            ",
            params![
                registrant.badge.as_str(),
                registrant.name,
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Lists registrants ordered by badge.
    pub fn list_registrants(&self) -> Result<Vec<Registrant>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT badge, name FROM registrants ORDER BY badge ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut registrants = Vec::new();
        for row in rows {
            let (badge, name) = row?;
            let badge = BadgeId::new(badge.clone()).map_err(|err| invalid(&badge, &err))?;
            registrants.push(Registrant { badge, name });
        }
        Ok(registrants)
    }

    /// Inserts a batch of scans, ignoring duplicates by ID.
    pub fn insert_scans(&mut self, scans: &[ScanEvent]) -> Result<usize, DbError> {
        if scans.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO access_logs (id, timestamp, action, zone, badge)
                VALUES (?, ?, ?, ?, ?)
                ",
            )?;
            for scan in scans {
                inserted += stmt.execute(params![
                    scan.id.as_str(),
                    format_timestamp(scan.timestamp),
                    scan.action.as_str(),
                    scan.zone.as_str(),
                    scan.badge.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(inserted, total = scans.len(), "stored scans");
        Ok(inserted)
    }

    /// Lists all scans ordered by timestamp then ID.
    pub fn list_scans(&self) -> Result<Vec<ScanEvent>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, timestamp, action, zone, badge
            FROM access_logs
            ORDER BY timestamp ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([], ScanRow::from_row)?;
        collect_scans(rows)
    }

    /// Lists scans within a time range.
    ///
    /// The range is inclusive of `start` and exclusive of `end`.
    pub fn list_scans_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScanEvent>, DbError> {
        if end <= start {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "
            SELECT id, timestamp, action, zone, badge
            FROM access_logs
            WHERE timestamp >= ? AND timestamp < ?
            ORDER BY timestamp ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(
            [format_timestamp(start), format_timestamp(end)],
            ScanRow::from_row,
        )?;
        collect_scans(rows)
    }

    /// Loads the kiosk state for a badge in a zone on a venue day.
    ///
    /// A badge that has never been scanned there starts from the default state.
    pub fn load_checkpoint(
        &self,
        badge: &BadgeId,
        zone: &ZoneId,
        day: NaiveDate,
    ) -> Result<CheckpointState, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT open_entry, total_minutes
                FROM checkpoints
                WHERE badge = ? AND zone = ? AND day = ?
                ",
                params![badge.as_str(), zone.as_str(), day.to_string()],
                |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        let Some((open_entry, total_minutes)) = row else {
            return Ok(CheckpointState::default());
        };
        let record = format!("checkpoint {badge}/{zone}/{day}");
        let open_entry = open_entry
            .map(|ts| parse_timestamp(&ts, &record))
            .transpose()?;
        Ok(CheckpointState {
            open_entry,
            total_minutes,
        })
    }

    /// Stores the kiosk state for a badge in a zone on a venue day.
    pub fn save_checkpoint(
        &mut self,
        badge: &BadgeId,
        zone: &ZoneId,
        day: NaiveDate,
        state: &CheckpointState,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO checkpoints (badge, zone, day, open_entry, total_minutes)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(badge, zone, day) DO UPDATE SET
                open_entry = excluded.open_entry,
                total_minutes = excluded.total_minutes
            ",
            params![
                badge.as_str(),
                zone.as_str(),
                day.to_string(),
                state.open_entry.map(format_timestamp),
                state.total_minutes,
            ],
        )?;
        Ok(())
    }

    /// Kiosk minutes for a badge on one day, across zones.
    pub fn checkpoint_minutes_on(&self, badge: &BadgeId, day: NaiveDate) -> Result<i64, DbError> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(total_minutes), 0) FROM checkpoints WHERE badge = ? AND day = ?",
            params![badge.as_str(), day.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Kiosk minutes for a badge across all days and zones.
    pub fn checkpoint_minutes_total(&self, badge: &BadgeId) -> Result<i64, DbError> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(total_minutes), 0) FROM checkpoints WHERE badge = ?",
            params![badge.as_str()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Lists the last scan timestamp and scan count per zone, most recent first.
    pub fn last_scan_by_zone(&self) -> Result<Vec<ZoneLastScan>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT zone, MAX(timestamp) AS last_scan, COUNT(*)
            FROM access_logs
            GROUP BY zone
            ORDER BY last_scan DESC, zone ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ZoneLastScan {
                zone: row.get(0)?,
                last_scan: row.get(1)?,
                scans: row.get(2)?,
            })
        })?;
        let mut zones = Vec::new();
        for row in rows {
            zones.push(row?);
        }
        Ok(zones)
    }
}

#[derive(Debug)]
struct ScanRow {
    id: String,
    timestamp: String,
    action: String,
    zone: String,
    badge: String,
}

impl ScanRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            action: row.get(2)?,
            zone: row.get(3)?,
            badge: row.get(4)?,
        })
    }

    fn into_event(self) -> Result<ScanEvent, DbError> {
        let timestamp = parse_timestamp(&self.timestamp, &self.id)?;
        let action: ScanAction = self.action.parse().map_err(|err| DbError::InvalidRecord {
            record: self.id.clone(),
            message: format!("{err}"),
        })?;
        let zone = ZoneId::new(self.zone).map_err(|err| invalid(&self.id, &err))?;
        let badge = BadgeId::new(self.badge).map_err(|err| invalid(&self.id, &err))?;
        let id = EventId::new(self.id.clone()).map_err(|err| invalid(&self.id, &err))?;
        Ok(ScanEvent {
            id,
            timestamp,
            action,
            zone,
            badge,
        })
    }
}

fn collect_scans(
    rows: impl Iterator<Item = rusqlite::Result<ScanRow>>,
) -> Result<Vec<ScanEvent>, DbError> {
    let mut scans = Vec::new();
    for row in rows {
        scans.push(row?.into_event()?);
    }
    Ok(scans)
}

fn invalid(record: &str, err: &ValidationError) -> DbError {
    DbError::InvalidRecord {
        record: record.to_string(),
        message: err.to_string(),
    }
}

fn parse_timestamp(timestamp: &str, record: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            record: record.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
