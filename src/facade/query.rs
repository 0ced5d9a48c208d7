//! Query parameters

use crate::dates::{DateSelector, Day, DayOrder};
use crate::store::Document;

/// Parameters shared by `find`, `search`, `aggregate` and `distinct`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub(crate) filter: Document,
    pub(crate) fields: Vec<String>,
    pub(crate) exclude: Vec<String>,
    pub(crate) dates: DateSelector,
    pub(crate) limit: Option<u64>,
    pub(crate) order: DayOrder,
}

impl FindQuery {
    /// Matches everything in today's collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store filter applied to every collection
    pub fn filter(mut self, filter: Document) -> Self {
        self.filter = filter;
        self
    }

    /// Adds fields to include
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Adds fields to exclude
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Replaces the date selector
    pub fn dates(mut self, dates: DateSelector) -> Self {
        self.dates = dates;
        self
    }

    /// Adds one explicit day
    pub fn day(mut self, day: Day) -> Self {
        self.dates.days.push(day);
        self
    }

    /// Selects an inclusive interval
    pub fn between(mut self, from: Day, to: Day) -> Self {
        self.dates.days_from = Some(from);
        self.dates.days_to = Some(to);
        self
    }

    /// Caps the documents returned across all collections
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: DayOrder) -> Self {
        self.order = order;
        self
    }

    /// Oldest collection first
    pub fn ascending(self) -> Self {
        self.order(DayOrder::Ascending)
    }

    pub fn date_selector(&self) -> &DateSelector {
        &self.dates
    }

    pub fn requested_limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn day_order(&self) -> DayOrder {
        self.order
    }
}
