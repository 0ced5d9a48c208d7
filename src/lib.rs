//! daily-query - Query documents stored in one collection per calendar day
//!
//! A query names a set of days, binds the collections that exist for them
//! and runs the same filter, projection or pipeline in each one, newest
//! day first, under a single result budget shared by every collection.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod dates;
pub mod errors;
pub mod executor;
pub mod facade;
pub mod observability;
pub mod planner;
pub mod store;

pub use catalog::{CollectionCatalog, CollectionHandle, CollectionRef, ResolvedCollections};
pub use config::Config;
pub use dates::{DateRangeResolver, DateSelector, Day, DayOrder};
pub use errors::{QueryError, QueryErrorCode, QueryResult};
pub use executor::{Budget, CollectionBatch, Documents, FanOut, PipelineExecutor, ResultItem};
pub use facade::{DailyQuery, DayCollection, Distinct, FindQuery};
pub use planner::{Explain, Projection, ProjectionBuilder, QueryPlan};
pub use store::{
    ConnectionString, Document, DocumentStore, MemoryStore, StoreCollection, StoreError,
};

#[cfg(feature = "mongodb")]
pub use store::MongoStore;
