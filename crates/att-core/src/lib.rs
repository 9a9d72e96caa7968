//! Core domain logic for conference attendance tracking.
//!
//! This crate contains the fundamental types and logic for:
//! - Stay time: counted minutes from entry/exit scans, breaks and session bounds
//! - Zone schedules: per-day session windows, breaks and goals
//! - Compliance: per-registrant daily and cumulative completion
//! - Kiosk checkpoints: incremental minutes at checkout

pub mod compliance;
pub mod kiosk;
pub mod scan;
mod stay;
pub mod types;
pub mod zone;

pub use compliance::{
    AttendanceReport, DailyAttendance, Registrant, RegistrantAttendance, ReportSummary,
    ZoneAttendance, build_report,
};
pub use kiosk::{CheckpointChange, CheckpointOutcome, CheckpointState, GoalRule, checkpoint};
pub use scan::{ScanAction, ScanEvent, ScanLike, ScanWindow, UnknownScanAction, filter_scans};
pub use stay::{
    BreakInterval, Segment, SessionBounds, compute_stay_minutes, floor_minutes, pair_segments,
    segment_millis,
};
pub use types::{BadgeId, ClockTime, EventId, ValidationError, ZoneId, parse_utc_offset};
pub use zone::{CompletionMode, DaySchedule, ScheduleBook, ScheduleWarning, ZoneSchedule};
