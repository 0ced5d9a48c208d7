//! Fan-out executor
//!
//! Dispatches one plan to an ordered list of collections under a single
//! budget. Execution is pull-driven:
//!
//! 1. Nothing is dispatched until the caller pulls the first batch
//! 2. Each pull dispatches to exactly one collection, bounded by the
//!    remaining budget (find limit or trailing `$limit` stage)
//! 3. The bounded cursor is drained inside the dispatch and released
//!    before the batch is returned
//! 4. The batch size is charged to the budget
//! 5. An exhausted budget ends the fan-out, even with collections left
//! 6. A failed collection yields its error once and ends the fan-out

use std::collections::VecDeque;
use std::sync::Arc;

use crate::catalog::CollectionHandle;
use crate::errors::{QueryError, QueryResult};
use crate::observability::{log_event, Event, Logger, MetricsRegistry, Severity};
use crate::planner::{PlanMode, QueryPlan};
use crate::store::{Document, StoreCollection, StoreResult};

use super::budget::Budget;
use super::result::{CollectionBatch, ResultItem};

/// Budget used when the caller gives no limit
pub const DEFAULT_FETCH_BATCH: u64 = 1000;

/// Dispatches plans across collections
#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    fetch_batch: u64,
    metrics: Arc<MetricsRegistry>,
}

impl Default for PipelineExecutor {
    fn default() -> Self {
        Self::new(Arc::new(MetricsRegistry::new()))
    }
}

impl PipelineExecutor {
    /// Creates an executor reporting to `metrics`
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            fetch_batch: DEFAULT_FETCH_BATCH,
            metrics,
        }
    }

    /// Overrides the default budget; zero keeps the current value
    pub fn with_fetch_batch(mut self, fetch_batch: u64) -> Self {
        if fetch_batch > 0 {
            self.fetch_batch = fetch_batch;
        }
        self
    }

    pub fn fetch_batch(&self) -> u64 {
        self.fetch_batch
    }

    /// Returns the budget a fan-out over `total_count` documents would get
    pub fn budget(&self, total_count: u64, limit: Option<u64>) -> Budget {
        Budget::new(total_count, limit, self.fetch_batch)
    }

    /// Prepares a lazy fan-out of `plan` over `collections`, in order.
    ///
    /// No query is issued until the returned iterator is pulled.
    pub fn execute<C: StoreCollection>(
        &self,
        plan: QueryPlan,
        collections: Vec<CollectionHandle<C>>,
        total_count: u64,
        limit: Option<u64>,
    ) -> FanOut<C> {
        self.metrics.increment_queries_planned();
        FanOut {
            projection: plan.projection().map(|p| p.to_document()),
            plan,
            pending: collections.into(),
            budget: self.budget(total_count, limit),
            metrics: Arc::clone(&self.metrics),
            finished: false,
        }
    }
}

/// Lazy sequence of per-collection batches
pub struct FanOut<C> {
    plan: QueryPlan,
    projection: Option<Document>,
    pending: VecDeque<CollectionHandle<C>>,
    budget: Budget,
    metrics: Arc<MetricsRegistry>,
    finished: bool,
}

impl<C: StoreCollection> FanOut<C> {
    /// Current budget state
    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// Collections not yet dispatched
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Unwraps batches into `(document, collection)` items
    pub fn documents(self) -> Documents<C> {
        Documents {
            fanout: self,
            current: None,
        }
    }

    fn dispatch(&self, handle: &CollectionHandle<C>) -> QueryResult<CollectionBatch> {
        let remaining = self.budget.remaining();
        let collection = handle.collection();

        if Logger::enabled(Severity::Trace) {
            log_event(
                Event::CollectionDispatched,
                &[
                    ("collection", handle.name()),
                    ("mode", self.plan.mode().as_str()),
                    ("remaining", &remaining.to_string()),
                ],
            );
        }
        self.metrics.increment_collections_dispatched();

        let documents = {
            let cursor = match self.plan.mode() {
                PlanMode::Find => {
                    collection.find(self.plan.filter(), self.projection.as_ref(), Some(remaining))
                }
                PlanMode::Aggregate => collection.aggregate(&self.plan.bounded_pipeline(remaining)),
            }
            .map_err(|e| QueryError::pipeline_execution(handle.name(), e))?;

            cursor
                .take(remaining as usize)
                .collect::<StoreResult<Vec<_>>>()
                .map_err(|e| QueryError::pipeline_execution(handle.name(), e))?
        };

        Ok(CollectionBatch::new(handle.shared_name(), handle.day(), documents))
    }
}

impl<C: StoreCollection> Iterator for FanOut<C> {
    type Item = QueryResult<CollectionBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.budget.is_exhausted() {
            self.finished = true;
            if !self.pending.is_empty() {
                self.metrics.increment_short_circuits();
                log_event(
                    Event::BudgetExhausted,
                    &[("skipped", &self.pending.len().to_string())],
                );
            }
            return None;
        }

        let Some(handle) = self.pending.pop_front() else {
            self.finished = true;
            return None;
        };

        match self.dispatch(&handle) {
            Ok(batch) => {
                self.budget.consume(batch.matched());
                self.metrics.add_documents_returned(batch.matched());
                Some(Ok(batch))
            }
            Err(err) => {
                self.finished = true;
                self.metrics.increment_dispatch_failures();
                log_event(
                    Event::CollectionFailed,
                    &[("collection", handle.name()), ("error", err.message())],
                );
                Some(Err(err))
            }
        }
    }
}

/// Lazy sequence of documents with their source collection.
///
/// The next collection is dispatched only once the current batch has been
/// consumed.
pub struct Documents<C> {
    fanout: FanOut<C>,
    current: Option<(Arc<str>, std::vec::IntoIter<Document>)>,
}

impl<C: StoreCollection> Documents<C> {
    /// Drops the collection names, yielding bare documents
    pub fn bare(self) -> impl Iterator<Item = QueryResult<Document>> {
        self.map(|item| item.map(ResultItem::into_document))
    }

    /// Current budget state
    pub fn budget(&self) -> &Budget {
        self.fanout.budget()
    }
}

impl<C: StoreCollection> Iterator for Documents<C> {
    type Item = QueryResult<ResultItem>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((collection, documents)) = self.current.as_mut() {
                if let Some(document) = documents.next() {
                    return Some(Ok(ResultItem {
                        document,
                        collection: Arc::clone(collection),
                    }));
                }
            }
            match self.fanout.next()? {
                Ok(batch) => {
                    let (collection, documents) = batch.into_parts();
                    self.current = Some((collection, documents.into_iter()));
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
