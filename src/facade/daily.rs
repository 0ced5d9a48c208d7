//! Query facade over a day-partitioned store
//!
//! Every operation runs the same steps:
//!
//! 1. Resolve the date selector into ordered days
//! 2. Bind the days whose collection exists, and count them
//! 3. Build the projection and the per-collection plan
//! 4. Hand a lazy fan-out back to the caller
//!
//! Steps 1-3 run eagerly, so range and catalog errors surface from the
//! call itself. Per-collection query errors surface from the stream.

use std::sync::Arc;

use serde_json::Value;

use crate::catalog::{CollectionCatalog, CollectionRef, ResolvedCollections};
use crate::dates::{DateRangeResolver, DateSelector, Day, DayOrder};
use crate::errors::{QueryError, QueryResult};
use crate::executor::{Documents, FanOut, PipelineExecutor};
use crate::observability::{log_event, Event, Logger, MetricsRegistry, MetricsSnapshot, Severity};
use crate::planner::{Explain, ExplainCollection, ProjectionBuilder, QueryPlan};
use crate::store::{Document, DocumentStore};

use super::collection::DayCollection;
use super::distinct::{Distinct, GROUP_KEY};
use super::query::FindQuery;

/// Public entry point for day-partitioned queries
pub struct DailyQuery<S> {
    store: S,
    today: Option<Day>,
    executor: PipelineExecutor,
    metrics: Arc<MetricsRegistry>,
}

impl<S: DocumentStore> DailyQuery<S> {
    /// Creates a facade over a store
    pub fn new(store: S) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        Self {
            store,
            today: None,
            executor: PipelineExecutor::new(Arc::clone(&metrics)),
            metrics,
        }
    }

    /// Pins the day treated as today
    pub fn with_today(mut self, today: Day) -> Self {
        self.today = Some(today);
        self
    }

    /// Sets the budget used when a query gives no limit
    pub fn with_fetch_batch(mut self, fetch_batch: u64) -> Self {
        self.executor = self.executor.with_fetch_batch(fetch_batch);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Resolver anchored on the pinned day, or the current local date
    pub fn resolver(&self) -> DateRangeResolver {
        match self.today {
            Some(day) => DateRangeResolver::with_today(day),
            None => DateRangeResolver::new(),
        }
    }

    /// Resolves a selector into days.
    ///
    /// A selector with neither days nor bounds means today only.
    pub fn resolve_days(&self, dates: &DateSelector, order: DayOrder) -> QueryResult<Vec<Day>> {
        let resolver = self.resolver();
        let days = if dates.is_empty() {
            let today = resolver.today();
            resolver.resolve(&DateSelector::on(today), order)
        } else {
            resolver.resolve(dates, order)
        }
        .map_err(|e| self.rejected(e))?;

        if Logger::enabled(Severity::Trace) {
            log_event(
                Event::DatesResolved,
                &[
                    ("days", &days.len().to_string()),
                    ("order", order.as_str()),
                ],
            );
        }
        Ok(days)
    }

    /// Existing collections for the selected days, with their total count
    pub fn get_collections(
        &self,
        dates: &DateSelector,
        order: DayOrder,
    ) -> QueryResult<ResolvedCollections<S::Collection>> {
        let days = self.resolve_days(dates, order)?;
        CollectionCatalog::new(&self.store)
            .resolve_collections(&days)
            .map_err(|e| self.rejected(e))
    }

    /// Finds matching documents, one batch per collection
    pub fn find(&self, query: FindQuery) -> QueryResult<FanOut<S::Collection>> {
        let plan = QueryPlan::find(query.filter.clone(), Self::projection(&query));
        self.fan_out(plan, &query)
    }

    /// Like `find`, yielding individual `(document, collection)` items
    pub fn search(&self, query: FindQuery) -> QueryResult<Documents<S::Collection>> {
        Ok(self.find(query)?.documents())
    }

    /// Runs `stages` in every collection after the query's `$match` and
    /// optional `$project`
    pub fn aggregate(
        &self,
        query: FindQuery,
        stages: Vec<Document>,
    ) -> QueryResult<FanOut<S::Collection>> {
        let plan = QueryPlan::aggregate(query.filter.clone(), Self::projection(&query), stages);
        self.fan_out(plan, &query)
    }

    /// Distinct values of `field` across the selected collections
    pub fn distinct(&self, field: &str, query: FindQuery) -> QueryResult<Distinct<S::Collection>> {
        let mut key = Document::new();
        key.insert(GROUP_KEY.to_string(), Value::String(format!("${}", field)));
        let mut group = Document::new();
        group.insert("$group".to_string(), Value::Object(key));

        Ok(Distinct::new(self.aggregate(query, vec![group])?.documents()))
    }

    /// Reports what `find` would dispatch, without dispatching
    pub fn explain(&self, query: &FindQuery) -> QueryResult<Explain> {
        self.explain_plan(
            &QueryPlan::find(query.filter.clone(), Self::projection(query)),
            query,
        )
    }

    /// Reports what `aggregate` would dispatch, without dispatching
    pub fn explain_aggregate(&self, query: &FindQuery, stages: Vec<Document>) -> QueryResult<Explain> {
        self.explain_plan(
            &QueryPlan::aggregate(query.filter.clone(), Self::projection(query), stages),
            query,
        )
    }

    /// Binds a context on a single collection.
    ///
    /// Each call returns a fresh context; nothing is shared with earlier ones.
    pub fn collection(&self, reference: CollectionRef<S::Collection>) -> DayCollection<S::Collection> {
        DayCollection::new(reference.bind(&self.store), Arc::clone(&self.metrics))
    }

    /// Binds a context on one day's collection
    pub fn day(&self, day: Day) -> DayCollection<S::Collection> {
        self.collection(CollectionRef::from(day))
    }

    fn projection(query: &FindQuery) -> Option<crate::planner::Projection> {
        ProjectionBuilder::build(&query.fields, &query.exclude)
    }

    fn fan_out(&self, plan: QueryPlan, query: &FindQuery) -> QueryResult<FanOut<S::Collection>> {
        let (handles, total) = self.get_collections(&query.dates, query.order)?.into_parts();

        if Logger::enabled(Severity::Trace) {
            log_event(
                Event::QueryPlanned,
                &[
                    ("collections", &handles.len().to_string()),
                    ("mode", plan.mode().as_str()),
                    ("total_documents", &total.to_string()),
                ],
            );
        }

        Ok(self.executor.execute(plan, handles, total, query.limit))
    }

    fn explain_plan(&self, plan: &QueryPlan, query: &FindQuery) -> QueryResult<Explain> {
        let days = self.resolve_days(&query.dates, query.order)?;
        let resolved = CollectionCatalog::new(&self.store)
            .resolve_collections(&days)
            .map_err(|e| self.rejected(e))?;

        let mut collections = Vec::with_capacity(resolved.len());
        for handle in resolved.handles() {
            collections.push(ExplainCollection {
                name: handle.name().to_string(),
                documents: handle.count()?,
            });
        }

        let budget = self.executor.budget(resolved.total_documents(), query.limit);
        Ok(Explain::new(
            plan,
            query.order,
            days,
            collections,
            query.limit,
            budget.effective(),
        ))
    }

    fn rejected(&self, err: QueryError) -> QueryError {
        self.metrics.increment_queries_rejected();
        log_event(
            Event::QueryRejected,
            &[("code", err.code().code()), ("reason", err.message())],
        );
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::QueryErrorCode;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn day(s: &str) -> Day {
        s.parse().unwrap()
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn facade() -> DailyQuery<MemoryStore> {
        let store = MemoryStore::new();
        store
            .insert_values(
                "2024-01-01",
                vec![json!({"tags": ["rust", "db"]}), json!({"tags": "go"})],
            )
            .unwrap();
        store
            .insert_values("2024-01-02", vec![json!({"tags": "rust"}), json!({"tags": null})])
            .unwrap();
        DailyQuery::new(store).with_today(day("2024-01-02"))
    }

    #[test]
    fn test_empty_selector_means_today() {
        let q = facade();
        let days = q.resolve_days(&DateSelector::new(), DayOrder::Descending).unwrap();
        assert_eq!(days, vec![day("2024-01-02")]);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let q = facade();
        let err = q
            .find(FindQuery::new().between(day("2024-01-02"), day("2024-01-01")))
            .err()
            .unwrap();
        assert_eq!(err.code(), QueryErrorCode::InvalidRange);
        assert_eq!(q.metrics().queries_rejected, 1);
    }

    #[test]
    fn test_distinct_flattens_and_dedups() {
        let q = facade();
        let values: Vec<Value> = q
            .distinct("tags", FindQuery::new().dates(DateSelector::forever()))
            .unwrap()
            .collect::<QueryResult<_>>()
            .unwrap();
        assert_eq!(values, vec![json!("rust"), json!("db"), json!("go")]);
    }

    #[test]
    fn test_search_pairs() {
        let q = facade();
        let items: Vec<_> = q
            .search(FindQuery::new().day(day("2024-01-01")).filter(doc(json!({"tags": "go"}))))
            .unwrap()
            .collect::<QueryResult<_>>()
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].collection(), "2024-01-01");
    }

    #[test]
    fn test_explain_does_not_dispatch() {
        let q = facade();
        let explain = q
            .explain(&FindQuery::new().dates(DateSelector::forever()).limit(3))
            .unwrap();
        assert_eq!(explain.collections.len(), 2);
        assert_eq!(explain.total_documents, 4);
        assert_eq!(explain.effective_limit, 3);
        assert!(q.store().dispatch_log().is_empty());
    }

    #[test]
    fn test_collection_contexts_are_independent() {
        let q = facade();
        let first = q.day(day("2024-01-01"));
        let second = q.collection(CollectionRef::from("2024-01-02"));
        assert_eq!(first.name(), "2024-01-01");
        assert_eq!(second.name(), "2024-01-02");
        assert_eq!(first.count().unwrap(), 2);
    }
}
