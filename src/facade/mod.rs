//! Query facade
//!
//! `DailyQuery` combines date resolution, catalog binding, planning and
//! fan-out execution behind `find`, `search`, `aggregate` and `distinct`.
//!
//! ```ignore
//! use daily_query::{DailyQuery, DateSelector, FindQuery, MemoryStore};
//!
//! let query = DailyQuery::new(MemoryStore::new());
//! for item in query.search(FindQuery::new().dates(DateSelector::forever()).limit(10))? {
//!     let item = item?;
//!     println!("{} {:?}", item.collection(), item.document);
//! }
//! ```

mod collection;
mod daily;
mod distinct;
mod query;

pub use collection::DayCollection;
pub use daily::DailyQuery;
pub use distinct::Distinct;
pub use query::FindQuery;
