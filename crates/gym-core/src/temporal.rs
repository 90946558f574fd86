//! # Temporal Types
//!
//! Membership windows are calendar dates (`YYYY-MM-DD`) with no
//! time-of-day. Check-in instants are `DateTime<Utc>`, accepted from
//! callers only when the text carries an explicit offset.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A date without time-of-day or timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Earliest representable date, `0001-01-01`.
    pub const MIN: Self = match NaiveDate::from_ymd_opt(1, 1, 1) {
        Some(d) => Self(d),
        None => panic!("0001-01-01 is a valid date"),
    };

    /// Latest representable date, `9999-12-31`. Anything later would not
    /// render as four-digit-year `YYYY-MM-DD`.
    pub const MAX: Self = match NaiveDate::from_ymd_opt(9999, 12, 31) {
        Some(d) => Self(d),
        None => panic!("9999-12-31 is a valid date"),
    };

    /// Wrap a `NaiveDate`, rejecting dates outside [`Self::MIN`]..=[`Self::MAX`].
    pub fn from_naive(date: NaiveDate) -> Result<Self, CoreError> {
        let candidate = Self(date);
        if candidate < Self::MIN || candidate > Self::MAX {
            return Err(CoreError::InvalidDate(date.to_string()));
        }
        Ok(candidate)
    }

    /// Build from year, month and day. `None` for impossible or
    /// out-of-range dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(|d| Self::from_naive(d).ok())
    }

    /// Parse strict `YYYY-MM-DD` text.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let bytes = s.as_bytes();
        let shaped = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !shaped {
            return Err(CoreError::InvalidDate(s.to_string()));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| Self::from_naive(d).ok())
            .ok_or_else(|| CoreError::InvalidDate(s.to_string()))
    }

    /// Current date on the server clock, in UTC.
    pub fn today_utc() -> Self {
        Self(Utc::now().date_naive())
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// Add whole calendar days. Fails past [`Self::MAX`].
    pub fn add_days(self, days: u32) -> Result<Self, CoreError> {
        self.0
            .checked_add_days(Days::new(u64::from(days)))
            .map(Self)
            .filter(|end| *end <= Self::MAX)
            .ok_or_else(|| CoreError::DateOverflow {
                date: self.to_string(),
                days,
            })
    }

    /// First instant of the date in UTC.
    pub fn start_of_day(self) -> DateTime<Utc> {
        NaiveDateTime::new(self.0, NaiveTime::MIN).and_utc()
    }

    /// Last millisecond of the date in UTC (23:59:59.999).
    pub fn end_of_day(self) -> DateTime<Utc> {
        self.start_of_day() + Duration::days(1) - Duration::milliseconds(1)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CalendarDate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<NaiveDate> for CalendarDate {
    type Error = CoreError;

    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        Self::from_naive(date)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse an ISO-8601 / RFC 3339 timestamp that carries an offset and
/// normalize it to UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, CoreError> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| CoreError::InvalidTimestamp(s.to_string()))
}
