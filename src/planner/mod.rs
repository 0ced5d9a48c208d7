//! Query planning
//!
//! Compiles caller parameters into an immutable per-collection plan:
//!
//! - include/exclude field lists become one unmixed projection
//! - a filter becomes either a direct find or a `$match`-led pipeline
//! - `explain` reports the plan and its fan-out without dispatching

mod explain;
mod plan;
mod projection;

pub use explain::{Explain, ExplainCollection};
pub use plan::{PlanMode, QueryPlan};
pub use projection::{FieldMode, Projection, ProjectionBuilder};
