//! Badge scan events recorded at zone checkpoints.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BadgeId, EventId, ZoneId};

/// Direction of a checkpoint scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanAction {
    Entry,
    Exit,
}

impl ScanAction {
    /// String representation for storage and export.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "ENTRY",
            Self::Exit => "EXIT",
        }
    }
}

impl fmt::Display for ScanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScanAction {
    type Err = UnknownScanAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ENTRY" | "entry" | "Entry" => Ok(Self::Entry),
            "EXIT" | "exit" | "Exit" => Ok(Self::Exit),
            _ => Err(UnknownScanAction(s.to_string())),
        }
    }
}

impl Serialize for ScanAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScanAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown scan action strings.
#[derive(Debug, Clone)]
pub struct UnknownScanAction(String);

impl fmt::Display for UnknownScanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown scan action: {}", self.0)
    }
}

impl std::error::Error for UnknownScanAction {}

/// Anything the stay-time calculator can consume.
///
/// Lets the calculator work with stored rows, in-memory fixtures, or bare
/// `(timestamp, action)` pairs alike.
pub trait ScanLike {
    /// When the badge was scanned.
    fn timestamp(&self) -> DateTime<Utc>;

    /// Whether the scan opened or closed a visit.
    fn action(&self) -> ScanAction;
}

impl ScanLike for (DateTime<Utc>, ScanAction) {
    fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    fn action(&self) -> ScanAction {
        self.1
    }
}

/// One access-log record: a badge scanned at a zone checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// Unique identifier for this record.
    pub id: EventId,
    /// When the scan happened.
    pub timestamp: DateTime<Utc>,
    /// Entry or exit.
    pub action: ScanAction,
    /// The zone whose checkpoint recorded the scan.
    pub zone: ZoneId,
    /// The scanned badge payload.
    pub badge: BadgeId,
}

impl ScanLike for ScanEvent {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn action(&self) -> ScanAction {
        self.action
    }
}

/// The stretch of time whose scans belong to one zone session.
///
/// Half-open: `from` is included and `until` is not, so the windows of
/// consecutive days never share a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl ScanWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.until
    }
}

/// Selects one badge's scans for one zone inside `window`.
///
/// Input order is preserved; the calculator sorts on its own.
pub fn filter_scans<'a, I>(
    events: I,
    badge: &BadgeId,
    zone: &ZoneId,
    window: ScanWindow,
) -> Vec<&'a ScanEvent>
where
    I: IntoIterator<Item = &'a ScanEvent>,
{
    events
        .into_iter()
        .filter(|e| &e.badge == badge && &e.zone == zone)
        .filter(|e| window.contains(e.timestamp))
        .collect()
}

impl<T: ScanLike + ?Sized> ScanLike for &T {
    fn timestamp(&self) -> DateTime<Utc> {
        (**self).timestamp()
    }

    fn action(&self) -> ScanAction {
        (**self).action()
    }
}
