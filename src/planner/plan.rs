//! Per-collection query plans
//!
//! A plan is immutable and collection-independent. The same plan is
//! dispatched to every collection of a fan-out; only the bound on the
//! number of documents changes between dispatches.

use serde::Serialize;
use serde_json::{json, Value};

use crate::store::Document;

use super::projection::Projection;

/// How a plan is dispatched to a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanMode {
    /// Filtered find with projection
    Find,
    /// Aggregation pipeline
    Aggregate,
}

impl PlanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanMode::Find => "find",
            PlanMode::Aggregate => "aggregate",
        }
    }
}

/// Immutable query plan (no runtime state)
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    mode: PlanMode,
    filter: Document,
    projection: Option<Projection>,
    stages: Vec<Document>,
}

impl QueryPlan {
    /// A filtered find
    pub fn find(filter: Document, projection: Option<Projection>) -> Self {
        Self {
            mode: PlanMode::Find,
            filter,
            projection,
            stages: Vec::new(),
        }
    }

    /// An aggregation: `$match` on the filter, optional `$project`, then
    /// the caller's stages
    pub fn aggregate(filter: Document, projection: Option<Projection>, stages: Vec<Document>) -> Self {
        Self {
            mode: PlanMode::Aggregate,
            filter,
            projection,
            stages,
        }
    }

    pub fn mode(&self) -> PlanMode {
        self.mode
    }

    pub fn filter(&self) -> &Document {
        &self.filter
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// Caller-supplied stages
    pub fn stages(&self) -> &[Document] {
        &self.stages
    }

    /// The unbounded pipeline equivalent of this plan
    pub fn pipeline(&self) -> Vec<Document> {
        let mut pipeline = Vec::with_capacity(self.stages.len() + 2);
        pipeline.push(stage("$match", Value::Object(self.filter.clone())));
        if let Some(projection) = &self.projection {
            pipeline.push(stage("$project", Value::Object(projection.to_document())));
        }
        pipeline.extend(self.stages.iter().cloned());
        pipeline
    }

    /// The pipeline capped at `limit` output documents
    pub fn bounded_pipeline(&self, limit: u64) -> Vec<Document> {
        let mut pipeline = self.pipeline();
        pipeline.push(stage("$limit", json!(limit)));
        pipeline
    }
}

fn stage(name: &str, body: Value) -> Document {
    let mut doc = Document::new();
    doc.insert(name.to_string(), body);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::ProjectionBuilder;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_find_plan() {
        let plan = QueryPlan::find(doc(json!({"lang": "en"})), None);
        assert_eq!(plan.mode(), PlanMode::Find);
        assert_eq!(plan.filter(), &doc(json!({"lang": "en"})));
        assert!(plan.projection().is_none());
    }

    #[test]
    fn test_pipeline_order() {
        let plan = QueryPlan::aggregate(
            doc(json!({"lang": "en"})),
            ProjectionBuilder::build(["title"], Vec::<String>::new()),
            vec![doc(json!({"$sort": {"title": 1}}))],
        );

        assert_eq!(
            plan.pipeline(),
            vec![
                doc(json!({"$match": {"lang": "en"}})),
                doc(json!({"$project": {"title": 1}})),
                doc(json!({"$sort": {"title": 1}})),
            ]
        );
    }

    #[test]
    fn test_bounded_pipeline_appends_limit() {
        let plan = QueryPlan::aggregate(Document::new(), None, Vec::new());
        assert_eq!(
            plan.bounded_pipeline(4),
            vec![doc(json!({"$match": {}})), doc(json!({"$limit": 4}))]
        );
    }
}
