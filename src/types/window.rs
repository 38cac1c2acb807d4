//! The date range requested from the observation service.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// An inclusive calendar range of observations to request.
///
/// Defaults to January 2017.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ObservationWindow {
    /// Returns `None` when `end` precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Query parameters in the `year1/month1/day1`, `year2/month2/day2` form the
    /// IEM request script expects.
    pub(crate) fn query_pairs(&self) -> [(&'static str, String); 6] {
        [
            ("year1", self.start.year().to_string()),
            ("month1", format!("{:02}", self.start.month())),
            ("day1", format!("{:02}", self.start.day())),
            ("year2", self.end.year().to_string()),
            ("month2", format!("{:02}", self.end.month())),
            ("day2", format!("{:02}", self.end.day())),
        ]
    }
}

impl Default for ObservationWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2017, 1, 31).unwrap_or_default(),
        }
    }
}

impl fmt::Display for ObservationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
