//! Calendar date windows for daily data.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed-open interval `[start, end)` of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DateWindowDefinition")]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

/// Serialized form of a [`DateWindow`]: two ISO 8601 strings.
#[derive(Debug, Clone, Deserialize)]
pub struct DateWindowDefinition {
    pub start: String,
    pub end: String,
}

impl DateWindow {
    /// Create a window; `start` must be strictly before `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateParseError> {
        if start >= end {
            return Err(DateParseError::EmptyWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from ISO 8601 strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, DateParseError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive end date.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// Number of calendar days in the window.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Every date in the window, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.num_days()).map(move |offset| self.start + Duration::days(offset))
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl TryFrom<DateWindowDefinition> for DateWindow {
    type Error = DateParseError;

    fn try_from(raw: DateWindowDefinition) -> Result<Self, Self::Error> {
        Self::parse(&raw.start, &raw.end)
    }
}

/// Parse an ISO 8601 calendar date.
///
/// Accepts `YYYY-MM-DD`, or a full RFC 3339 timestamp which is truncated to
/// its UTC date.
pub fn parse_date(s: &str) -> Result<NaiveDate, DateParseError> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }

    Err(DateParseError::InvalidFormat(s.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum DateParseError {
    #[error("Invalid date format: {0}. Expected YYYY-MM-DD")]
    InvalidFormat(String),

    #[error("Date window is empty: start {start} is not before end {end}")]
    EmptyWindow { start: NaiveDate, end: NaiveDate },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_is_closed_open() {
        let window = DateWindow::parse("2024-06-01", "2024-09-01").unwrap();
        assert!(window.contains(date(2024, 6, 1)));
        assert!(window.contains(date(2024, 8, 31)));
        assert!(!window.contains(date(2024, 9, 1)));
        assert!(!window.contains(date(2024, 5, 31)));
        assert_eq!(window.num_days(), 92);
    }

    #[test]
    fn test_parse_rfc3339() {
        let d = parse_date("2024-06-01T23:30:00-02:00").unwrap();
        assert_eq!(d, date(2024, 6, 2));
    }

    #[test]
    fn test_rejects_empty_window() {
        assert!(matches!(
            DateWindow::parse("2024-06-01", "2024-06-01"),
            Err(DateParseError::EmptyWindow { .. })
        ));
        assert!(DateWindow::parse("June 1st", "2024-06-02").is_err());
    }

    #[test]
    fn test_days_iterator() {
        let window = DateWindow::parse("2024-02-28", "2024-03-02").unwrap();
        let days: Vec<_> = window.days().collect();
        assert_eq!(days, vec![date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1)]);
    }
}
