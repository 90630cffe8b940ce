//! Month-granular calendar arithmetic.
//!
//! Facts, stock snapshots and forecast points are all keyed by the first day of a
//! calendar month. Windows such as "the 3 months ending in October" or "the 12
//! months after the anchor" regularly cross a year boundary, so all offsets go
//! through [`YearMonth::add_months`] instead of ad hoc date string handling.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("invalid year-month '{0}', expected YYYY-MM")]
    Malformed(String),

    #[error("month {0} is outside 1..=12")]
    MonthOutOfRange(u32),
}

/// A calendar month, e.g. `2025-10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, CalendarError> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }

    /// Month from literal parts; `month` must already be in 1..=12.
    pub(crate) const fn from_parts(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month number, 1..=12.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month, the key used by every monthly table.
    pub fn first_day(&self) -> NaiveDate {
        // year/month are validated on construction, day 1 always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Shift by `delta` months in either direction, wrapping across years.
    pub fn add_months(&self, delta: i32) -> Self {
        let zero_based = self.year * 12 + (self.month as i32 - 1) + delta;
        Self {
            year: zero_based.div_euclid(12),
            month: (zero_based.rem_euclid(12) + 1) as u32,
        }
    }

    pub fn next(&self) -> Self {
        self.add_months(1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| CalendarError::Malformed(trimmed.to_string()))?;
        let year: i32 = year
            .parse()
            .map_err(|_| CalendarError::Malformed(trimmed.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| CalendarError::Malformed(trimmed.to_string()))?;
        Self::new(year, month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A contiguous run of `len` months beginning at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthWindow {
    start: YearMonth,
    len: u32,
}

impl MonthWindow {
    pub fn new(start: YearMonth, len: u32) -> Self {
        Self { start, len }
    }

    /// The `len` months that end with (and include) `last`.
    pub fn ending_at(last: YearMonth, len: u32) -> Self {
        Self {
            start: last.add_months(1 - len as i32),
            len,
        }
    }

    /// A full calendar year, January through December.
    pub fn calendar_year(year: i32) -> Self {
        Self {
            start: YearMonth { year, month: 1 },
            len: 12,
        }
    }

    pub fn start(&self) -> YearMonth {
        self.start
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn last(&self) -> YearMonth {
        self.start.add_months(self.len as i32 - 1)
    }

    /// Months in forward calendar order.
    pub fn months(&self) -> impl Iterator<Item = YearMonth> + '_ {
        (0..self.len as i32).map(move |offset| self.start.add_months(offset))
    }

    /// Leading sub-window of at most `len` months.
    pub fn take(&self, len: u32) -> Self {
        Self {
            start: self.start,
            len: len.min(self.len),
        }
    }

    pub fn contains(&self, month: YearMonth) -> bool {
        !self.is_empty() && month >= self.start && month <= self.last()
    }

    /// First day of the first month, inclusive lower bound for date filters.
    pub fn first_day(&self) -> NaiveDate {
        self.start.first_day()
    }

    /// First day of the last month, inclusive upper bound for date filters.
    pub fn last_day_key(&self) -> NaiveDate {
        self.last().first_day()
    }
}

impl fmt::Display for MonthWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.last())
    }
}
