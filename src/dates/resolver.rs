//! Date range resolution
//!
//! Turns explicit days and/or a `[days_from, days_to]` interval into a
//! deduplicated, ordered list of days.
//!
//! # Rules
//!
//! - The interval is expanded when either bound is given, or when no
//!   explicit day is given at all.
//! - A missing `days_from` is the beginning of time, a missing `days_to`
//!   is today.
//! - Explicit days and the expanded interval are merged with set semantics.
//! - Output is most-recent-first unless ascending order is requested.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::day::Day;
use crate::errors::{QueryError, QueryResult};

/// Ordering of resolved days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOrder {
    /// Most recent first
    #[default]
    Descending,
    /// Oldest first
    Ascending,
}

impl DayOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayOrder::Descending => "descending",
            DayOrder::Ascending => "ascending",
        }
    }
}

/// The caller's date request: explicit days and/or an interval
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSelector {
    /// Explicit days
    #[serde(default)]
    pub days: Vec<Day>,
    /// Inclusive lower bound
    #[serde(default)]
    pub days_from: Option<Day>,
    /// Inclusive upper bound
    #[serde(default)]
    pub days_to: Option<Day>,
}

impl DateSelector {
    /// Creates an empty selector
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a single day
    pub fn on(day: Day) -> Self {
        Self::between(day, day)
    }

    /// Selects an inclusive interval
    pub fn between(from: Day, to: Day) -> Self {
        Self {
            days: Vec::new(),
            days_from: Some(from),
            days_to: Some(to),
        }
    }

    /// Selects every day from the beginning of time to today
    pub fn forever() -> Self {
        Self::new().since(Day::epoch())
    }

    /// Sets the lower bound
    pub fn since(mut self, day: Day) -> Self {
        self.days_from = Some(day);
        self
    }

    /// Sets the upper bound
    pub fn until(mut self, day: Day) -> Self {
        self.days_to = Some(day);
        self
    }

    /// Adds explicit days
    pub fn with_days(mut self, days: impl IntoIterator<Item = Day>) -> Self {
        self.days.extend(days);
        self
    }

    /// Builds a selector from raw caller strings.
    ///
    /// Bounds equal to a no-value marker (`"None"`, `"null"`, empty) are
    /// treated as absent.
    pub fn parse<S: AsRef<str>>(
        days: &[S],
        days_from: Option<&str>,
        days_to: Option<&str>,
    ) -> QueryResult<Self> {
        let days = days
            .iter()
            .map(|d| Day::parse(d.as_ref()))
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(Self {
            days,
            days_from: Day::parse_optional(days_from)?,
            days_to: Day::parse_optional(days_to)?,
        })
    }

    /// Returns true when neither explicit days nor bounds are set
    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && self.days_from.is_none() && self.days_to.is_none()
    }

    /// Returns true when the interval must be expanded
    fn expands_range(&self) -> bool {
        self.days_from.is_some() || self.days_to.is_some() || self.days.is_empty()
    }
}

/// Resolves date selectors into ordered days
#[derive(Debug, Clone)]
pub struct DateRangeResolver {
    today: Day,
}

impl Default for DateRangeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DateRangeResolver {
    /// Creates a resolver anchored on the local current date
    pub fn new() -> Self {
        Self {
            today: Day::today(),
        }
    }

    /// Creates a resolver anchored on a fixed "today"
    pub fn with_today(today: Day) -> Self {
        Self { today }
    }

    /// Returns the day treated as today
    pub fn today(&self) -> Day {
        self.today
    }

    /// Resolves a selector into a deduplicated, ordered list of days.
    ///
    /// Fails with `InvalidRange` when `days_from > days_to` after defaulting.
    pub fn resolve(&self, selector: &DateSelector, order: DayOrder) -> QueryResult<Vec<Day>> {
        let mut all_days: BTreeSet<Day> = selector.days.iter().copied().collect();

        if selector.expands_range() {
            let start = selector.days_from.unwrap_or_else(Day::epoch);
            let end = selector.days_to.unwrap_or(self.today);

            if start > end {
                return Err(QueryError::invalid_range(format!(
                    "days_to ({}) must not precede days_from ({})",
                    end, start
                )));
            }

            all_days.extend(
                start
                    .date()
                    .iter_days()
                    .take_while(|d| *d <= end.date())
                    .map(Day::new),
            );
        }

        let days: Vec<Day> = match order {
            DayOrder::Ascending => all_days.into_iter().collect(),
            DayOrder::Descending => all_days.into_iter().rev().collect(),
        };

        Ok(days)
    }
}
