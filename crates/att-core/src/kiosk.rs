//! Kiosk checkpoint flow.
//!
//! A kiosk keeps a running per-person total for a zone and day. Each checkout
//! adds the minutes of the visit that just ended, computed with the same break
//! rules as the report but without session clipping.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::scan::ScanAction;
use crate::stay::{BreakInterval, SessionBounds, floor_minutes, segment_millis};
use crate::zone::CompletionMode;

/// Running kiosk state for one badge in one zone on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointState {
    /// When the current visit started, if the badge is checked in.
    pub open_entry: Option<DateTime<Utc>>,
    /// Minutes accumulated from completed visits.
    pub total_minutes: i64,
}

/// What a scan did to the checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointChange {
    /// A visit started.
    CheckedIn,
    /// A visit ended and its minutes were added.
    CheckedOut { added_minutes: i64 },
    /// ENTRY while already inside; the earlier entry stands.
    AlreadyInside,
    /// EXIT with no visit open.
    NotInside,
}

/// Result of applying one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointOutcome {
    pub change: CheckpointChange,
    pub state: CheckpointState,
}

/// Applies one kiosk scan to `state`.
///
/// Duplicate reads are absorbed the same way the stay-time calculator absorbs
/// them: the first ENTRY of a run wins and a stray EXIT changes nothing. Each
/// checkout is floored to whole minutes on its own.
pub fn checkpoint<Tz: TimeZone>(
    state: CheckpointState,
    action: ScanAction,
    at: DateTime<Utc>,
    breaks: &[BreakInterval],
    tz: &Tz,
) -> CheckpointOutcome {
    match (action, state.open_entry) {
        (ScanAction::Entry, None) => CheckpointOutcome {
            change: CheckpointChange::CheckedIn,
            state: CheckpointState {
                open_entry: Some(at),
                ..state
            },
        },
        (ScanAction::Entry, Some(_)) => CheckpointOutcome {
            change: CheckpointChange::AlreadyInside,
            state,
        },
        (ScanAction::Exit, Some(entry)) => {
            let added_minutes =
                floor_minutes(segment_millis(entry, at, breaks, &SessionBounds::UNBOUNDED, tz));
            CheckpointOutcome {
                change: CheckpointChange::CheckedOut { added_minutes },
                state: CheckpointState {
                    open_entry: None,
                    total_minutes: state.total_minutes + added_minutes,
                },
            }
        }
        (ScanAction::Exit, None) => CheckpointOutcome {
            change: CheckpointChange::NotInside,
            state,
        },
    }
}

/// Thresholds a kiosk checks after a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalRule {
    pub mode: CompletionMode,
    pub daily_goal_minutes: i64,
    pub cumulative_goal_minutes: i64,
}

impl GoalRule {
    /// Whether the goal is met given today's and all-days minutes.
    pub const fn is_met(&self, daily_minutes: i64, cumulative_minutes: i64) -> bool {
        match self.mode {
            CompletionMode::DailySeparate => daily_minutes >= self.daily_goal_minutes,
            CompletionMode::Cumulative => cumulative_minutes >= self.cumulative_goal_minutes,
        }
    }
}
