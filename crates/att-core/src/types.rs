//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A wall-clock time was not in `HH:MM` form.
    #[error("invalid clock time {value:?}, expected HH:MM")]
    InvalidClockTime { value: String },

    /// A UTC offset was not in `+HH:MM` form.
    #[error("invalid UTC offset {value:?}, expected +HH:MM or -HH:MM")]
    InvalidUtcOffset { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            ///
            /// Surrounding whitespace is trimmed; an empty result is rejected.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                if trimmed.len() == id.len() {
                    Ok(Self(id))
                } else {
                    Ok(Self(trimmed.to_string()))
                }
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated scan record identifier.
    ///
    /// Uniqueness is enforced at the database level.
    EventId, "event ID"
);

define_string_id!(
    /// The opaque badge / QR payload that ties a scan to a registrant.
    BadgeId, "badge ID"
);

define_string_id!(
    /// A validated zone identifier (lecture room, exhibition hall, ...).
    ZoneId, "zone ID"
);

/// A wall-clock time of day with minute resolution, written `HH:MM`.
///
/// Clock times carry no date or zone; [`ClockTime::on`] anchors one to a
/// calendar day in a venue time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    pub const MIDNIGHT: Self = Self(NaiveTime::MIN);

    /// Creates a clock time from an hour (0-23) and minute (0-59).
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidClockTime {
                value: format!("{hour}:{minute}"),
            })
    }

    /// Returns the underlying time of day.
    #[must_use]
    pub const fn time(self) -> NaiveTime {
        self.0
    }

    /// Anchors this clock time to `date` in `tz` and returns the absolute instant.
    ///
    /// Ambiguous local times (DST fall-back) resolve to the earlier instant.
    /// Local times that do not exist (DST spring-forward gap) resolve one hour later.
    pub fn on<Tz: TimeZone>(self, date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
        let local = date.and_time(self.0);
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            LocalResult::None => {
                let shifted = local + Duration::hours(1);
                tz.from_local_datetime(&shifted).earliest().map_or_else(
                    || tz.from_utc_datetime(&local).with_timezone(&Utc),
                    |dt| dt.with_timezone(&Utc),
                )
            }
        }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidClockTime {
            value: s.to_string(),
        };
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl Serialize for ClockTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses a UTC offset such as `+09:00`, `-05:30` or `Z`.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, ValidationError> {
    let trimmed = s.trim();
    let invalid = || ValidationError::InvalidUtcOffset {
        value: s.to_string(),
    };
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDateTime;

    #[test]
    fn badge_id_rejects_empty() {
        assert!(BadgeId::new("").is_err());
        assert!(BadgeId::new("   ").is_err());
        assert!(BadgeId::new("QR-0001").is_ok());
    }

    #[test]
    fn badge_id_trims_whitespace() {
        let id = BadgeId::new("  QR-0001\n").unwrap();
        assert_eq!(id.as_str(), "QR-0001");
    }

    #[test]
    fn zone_id_serde_roundtrip() {
        let id = ZoneId::new("hall-a").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"hall-a\"");
        let parsed: ZoneId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn event_id_serde_rejects_empty() {
        let result: Result<EventId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn clock_time_parses_and_displays() {
        let t: ClockTime = "09:05".parse().unwrap();
        assert_eq!(t.to_string(), "09:05");
        let t: ClockTime = "9:05".parse().unwrap();
        assert_eq!(t.to_string(), "09:05");
        assert_eq!("23:59".parse::<ClockTime>().unwrap(), ClockTime::from_hm(23, 59).unwrap());
    }

    #[test]
    fn clock_time_rejects_malformed() {
        for bad in ["", "12", "24:00", "12:60", "12:5", "ab:cd", "123:00", "12:00:00"] {
            assert!(bad.parse::<ClockTime>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn clock_time_serde_roundtrip() {
        let t = ClockTime::from_hm(12, 30).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"12:30\"");
        let parsed: ClockTime = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn clock_time_on_applies_offset() {
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        let at = ClockTime::from_hm(9, 0).unwrap().on(date, &kst);
        assert_eq!(at.to_rfc3339(), "2025-05-10T00:00:00+00:00");
    }

    /// Central European time for 2025: +01:00, switching to +02:00 between
    /// 2025-03-30 01:00Z and 2025-10-26 01:00Z.
    #[derive(Debug, Clone, Copy)]
    struct Cet2025;

    impl Cet2025 {
        const WINTER: i32 = 3600;
        const SUMMER: i32 = 2 * 3600;

        fn is_summer(utc: NaiveDateTime) -> bool {
            let starts = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap().and_hms_opt(1, 0, 0).unwrap();
            let ends = NaiveDate::from_ymd_opt(2025, 10, 26).unwrap().and_hms_opt(1, 0, 0).unwrap();
            utc >= starts && utc < ends
        }

        fn offset(seconds: i32) -> FixedOffset {
            FixedOffset::east_opt(seconds).unwrap()
        }
    }

    impl TimeZone for Cet2025 {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            Self
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let summer = Self::is_summer(*local - Duration::seconds(Self::SUMMER.into()));
            let winter = !Self::is_summer(*local - Duration::seconds(Self::WINTER.into()));
            match (summer, winter) {
                (true, true) => {
                    LocalResult::Ambiguous(Self::offset(Self::SUMMER), Self::offset(Self::WINTER))
                }
                (true, false) => LocalResult::Single(Self::offset(Self::SUMMER)),
                (false, true) => LocalResult::Single(Self::offset(Self::WINTER)),
                (false, false) => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if Self::is_summer(*utc) {
                Self::offset(Self::SUMMER)
            } else {
                Self::offset(Self::WINTER)
            }
        }
    }

    #[test]
    fn clock_time_in_spring_gap_moves_one_hour_later() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap();
        // 02:30 does not exist; 03:30 CEST does.
        let at = ClockTime::from_hm(2, 30).unwrap().on(date, &Cet2025);
        assert_eq!(at.to_rfc3339(), "2025-03-30T01:30:00+00:00");

        let before = ClockTime::from_hm(1, 59).unwrap().on(date, &Cet2025);
        assert_eq!(before.to_rfc3339(), "2025-03-30T00:59:00+00:00");
    }

    #[test]
    fn clock_time_in_autumn_fold_takes_earlier_instant() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 26).unwrap();
        // 02:30 happens twice: first at +02:00, then at +01:00.
        let at = ClockTime::from_hm(2, 30).unwrap().on(date, &Cet2025);
        assert_eq!(at.to_rfc3339(), "2025-10-26T00:30:00+00:00");

        let after = ClockTime::from_hm(3, 0).unwrap().on(date, &Cet2025);
        assert_eq!(after.to_rfc3339(), "2025-10-26T02:00:00+00:00");
    }

    #[test]
    fn midnight_anchors_start_of_venue_day() {
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 5, 11).unwrap();
        assert_eq!(ClockTime::MIDNIGHT.to_string(), "00:00");
        assert_eq!(ClockTime::MIDNIGHT.on(date, &kst).to_rfc3339(), "2025-05-10T15:00:00+00:00");
    }

    #[test]
    fn parse_utc_offset_accepts_common_forms() {
        assert_eq!(parse_utc_offset("+09:00").unwrap().local_minus_utc(), 9 * 3600);
        assert_eq!(parse_utc_offset("-05:30").unwrap().local_minus_utc(), -(5 * 3600 + 1800));
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("UTC").unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn parse_utc_offset_rejects_malformed() {
        for bad in ["", "09:00", "+9:00", "+24:00", "+09:60", "+0900"] {
            assert!(parse_utc_offset(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
