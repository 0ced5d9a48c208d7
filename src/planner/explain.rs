//! Explain output
//!
//! Describes what a fan-out would do without dispatching any query:
//! resolved days, retained collections with their counts, the effective
//! budget and the per-collection pipeline.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::dates::{Day, DayOrder};
use crate::store::Document;

use super::plan::QueryPlan;

/// One retained collection in an explain report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplainCollection {
    pub name: String,
    pub documents: u64,
}

/// Explain report for one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explain {
    /// Dispatch mode
    pub mode: &'static str,
    /// Day order
    pub order: DayOrder,
    /// Days after resolution, in dispatch order
    pub days: Vec<Day>,
    /// Existing collections for those days
    pub collections: Vec<ExplainCollection>,
    /// Sum of the collections' document counts
    pub total_documents: u64,
    /// Limit as requested by the caller
    pub requested_limit: Option<u64>,
    /// `min(total_documents, limit)`
    pub effective_limit: u64,
    /// Filter sent to each collection
    pub filter: Document,
    /// Projection sent to each collection
    pub projection: Option<Document>,
    /// Equivalent per-collection pipeline, without the budget bound
    pub pipeline: Vec<Document>,
}

impl Explain {
    /// Builds a report from a plan and its resolved inputs
    pub fn new(
        plan: &QueryPlan,
        order: DayOrder,
        days: Vec<Day>,
        collections: Vec<ExplainCollection>,
        requested_limit: Option<u64>,
        effective_limit: u64,
    ) -> Self {
        let total_documents = collections.iter().map(|c| c.documents).sum();
        Self {
            mode: plan.mode().as_str(),
            order,
            days,
            collections,
            total_documents,
            requested_limit,
            effective_limit,
            filter: plan.filter().clone(),
            projection: plan.projection().map(|p| p.to_document()),
            pipeline: plan.pipeline(),
        }
    }

    /// Report as a JSON value
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl fmt::Display for Explain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;
        writeln!(f, "Mode: {}", self.mode)?;
        writeln!(f, "Order: {}", self.order.as_str())?;
        writeln!(f, "Days: {}", self.days.len())?;

        if self.collections.is_empty() {
            writeln!(f, "Collections: none")?;
        } else {
            writeln!(f, "Collections:")?;
            for collection in &self.collections {
                writeln!(f, "  - {} ({} documents)", collection.name, collection.documents)?;
            }
        }

        writeln!(f, "Total Documents: {}", self.total_documents)?;
        match self.requested_limit {
            Some(limit) => writeln!(f, "Limit: {}", limit)?,
            None => writeln!(f, "Limit: default")?,
        }
        writeln!(f, "Effective Limit: {}", self.effective_limit)?;

        writeln!(f, "Pipeline:")?;
        for stage in &self.pipeline {
            writeln!(f, "  {}", Value::Object(stage.clone()))?;
        }

        Ok(())
    }
}
