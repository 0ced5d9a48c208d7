//! Calendar day value type
//!
//! A `Day` names one day-collection. Its canonical string form is
//! `YYYY-MM-DD`, which is also the collection name.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::{QueryError, QueryResult};

/// Canonical day format, also the collection naming scheme
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepted date-time formats; the time part is discarded
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Strings treated as "no value" when parsing optional bounds
const NO_VALUE_MARKERS: [&str; 3] = ["", "None", "null"];

/// A calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Day(NaiveDate);

impl Day {
    /// Wraps a date
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Creates a day from its components, if valid
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Beginning of time for open-ended ranges (1970-01-01)
    pub fn epoch() -> Self {
        Self(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default())
    }

    /// Today in local time
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// Returns the underlying date
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Returns the following day
    pub fn succ(&self) -> Option<Day> {
        self.0.succ_opt().map(Self)
    }

    /// Parses a date or date-time string.
    ///
    /// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and the `T`-separated
    /// variant, with optional fractional seconds.
    pub fn parse(input: &str) -> QueryResult<Day> {
        let trimmed = input.trim();
        // fractional seconds are ignored
        let whole = trimmed.split('.').next().unwrap_or(trimmed);

        if let Ok(date) = NaiveDate::parse_from_str(whole, DATE_FORMAT) {
            return Ok(Self(date));
        }

        let mut last_err = None;
        for format in DATETIME_FORMATS {
            match NaiveDateTime::parse_from_str(whole, format) {
                Ok(dt) => return Ok(Self(dt.date())),
                Err(e) => last_err = Some(e),
            }
        }

        Err(match last_err {
            Some(e) => QueryError::invalid_date(input, e),
            None => QueryError::invalid_date(input, "unrecognized format"),
        })
    }

    /// Parses an optional bound, treating the no-value markers
    /// (`"None"`, `"null"`, empty) the same as an absent value.
    pub fn parse_optional(input: Option<&str>) -> QueryResult<Option<Day>> {
        match input.map(str::trim) {
            None => Ok(None),
            Some(s) if NO_VALUE_MARKERS.contains(&s) => Ok(None),
            Some(s) => Self::parse(s).map(Some),
        }
    }

    /// Returns the collection name for this day
    pub fn collection_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for Day {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for Day {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::QueryErrorCode;

    fn day(s: &str) -> Day {
        Day::parse(s).unwrap()
    }

    #[test]
    fn test_display_is_collection_name() {
        let d = Day::from_ymd(2024, 1, 3).unwrap();
        assert_eq!(d.to_string(), "2024-01-03");
        assert_eq!(d.collection_name(), "2024-01-03");
    }

    #[test]
    fn test_parse_datetime_variants() {
        let expected = Day::from_ymd(2021, 6, 22).unwrap();
        assert_eq!(day("2021-06-22"), expected);
        assert_eq!(day("2021-06-22 13:45:10"), expected);
        assert_eq!(day("2021-06-22 13:45:10.123456"), expected);
        assert_eq!(day("2021-06-22T08:00:00"), expected);
        assert_eq!(day("  2021-06-22 "), expected);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = Day::parse("22/06/2021").unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::InvalidRange);

        assert!(Day::parse("2021-02-30").is_err());
    }

    #[test]
    fn test_no_value_markers() {
        assert_eq!(Day::parse_optional(None).unwrap(), None);
        assert_eq!(Day::parse_optional(Some("None")).unwrap(), None);
        assert_eq!(Day::parse_optional(Some("null")).unwrap(), None);
        assert_eq!(Day::parse_optional(Some("  ")).unwrap(), None);
        assert_eq!(
            Day::parse_optional(Some("2024-01-01")).unwrap(),
            Day::from_ymd(2024, 1, 1)
        );
    }

    #[test]
    fn test_ordering_is_calendar_order() {
        assert!(day("2023-12-31") < day("2024-01-01"));
        assert_eq!(day("2024-02-28").succ(), Some(day("2024-02-29")));
    }

    #[test]
    fn test_serde_uses_canonical_form() {
        let d = day("2024-05-06");
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"2024-05-06\"");
        let back: Day = serde_json::from_str("\"2024-05-06\"").unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_epoch() {
        assert_eq!(Day::epoch().to_string(), "1970-01-01");
    }
}
