//! Fan-out execution
//!
//! Consumes a plan and an ordered list of collection handles and produces a
//! lazy stream of results under one global budget.
//!
//! # Guarantees
//!
//! - Collections are dispatched in the order given, one per pull
//! - Total yielded documents never exceed `min(total_count, limit)`
//! - No collection is queried once the budget is exhausted
//! - The first failing collection ends the stream
//! - Every store cursor is released before its batch is handed out

mod budget;
mod executor;
mod result;

pub use budget::Budget;
pub use executor::{Documents, FanOut, PipelineExecutor, DEFAULT_FETCH_BATCH};
pub use result::{CollectionBatch, ResultItem};
