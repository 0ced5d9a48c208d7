//! Date handling for day-partitioned collections
//!
//! Each calendar day's documents live in a collection named `YYYY-MM-DD`.
//! This module resolves caller date requests into the ordered list of days
//! a query fans out over.

mod day;
mod resolver;

pub use day::{Day, DATE_FORMAT};
pub use resolver::{DateRangeResolver, DateSelector, DayOrder};
