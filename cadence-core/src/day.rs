//! Calendar-day arithmetic: date-only keys with no time-of-day component.
//!
//! All cadence math runs on calendar days so that day-of-week and timezone
//! boundaries can never cause an off-by-one. Arithmetic anchors intermediate
//! values at noon before re-truncating, so a DST transition on the path can
//! not shift the result to an adjacent day.

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A date with no time-of-day, serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Truncate a UTC timestamp to its calendar day.
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        Self(ts.date_naive())
    }

    /// Parse a `YYYY-MM-DD` key loaded from storage or user input.
    pub fn parse(s: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("invalid calendar day '{s}': {e}"))?;
        Ok(Self(date))
    }

    /// Add exactly `n` calendar days, crossing month/year boundaries.
    ///
    /// Anchored at noon so the intermediate value sits well away from any
    /// midnight boundary before re-truncation.
    pub fn add_days(self, n: i64) -> Self {
        let noon = self
            .0
            .and_hms_opt(12, 0, 0)
            .unwrap_or_else(|| self.0.and_time(chrono::NaiveTime::MIN));
        Self((noon + Duration::days(n)).date())
    }

    /// Signed whole-day difference `self - other`.
    pub fn day_diff(self, other: CalendarDay) -> i64 {
        (self.0 - other.0).num_days()
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
