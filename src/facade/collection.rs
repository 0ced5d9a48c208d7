//! Single day-collection context

use std::sync::Arc;

use serde_json::{json, Value};

use crate::errors::{QueryError, QueryResult};
use crate::observability::{log_event, Event, MetricsRegistry};
use crate::planner::Projection;
use crate::store::{Document, StoreCollection};

/// An immutable handle on one collection, for direct reads and upserts.
///
/// Obtained from `DailyQuery::collection`; switching collections means
/// asking for a new context.
#[derive(Debug, Clone)]
pub struct DayCollection<C> {
    name: Arc<str>,
    collection: C,
    metrics: Arc<MetricsRegistry>,
}

impl<C: StoreCollection> DayCollection<C> {
    pub(crate) fn new(collection: C, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            name: Arc::from(collection.name()),
            collection,
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the bound store collection
    pub fn inner(&self) -> &C {
        &self.collection
    }

    fn failed(&self) -> impl Fn(crate::store::StoreError) -> QueryError + '_ {
        move |e| QueryError::pipeline_execution(self.name.as_ref(), e)
    }

    /// Counts all documents
    pub fn count(&self) -> QueryResult<u64> {
        self.count_matching(&Document::new())
    }

    /// Counts documents matching a filter
    pub fn count_matching(&self, filter: &Document) -> QueryResult<u64> {
        self.collection.count_documents(filter).map_err(self.failed())
    }

    /// Finds matching documents in this collection only
    pub fn find(
        &self,
        filter: &Document,
        projection: Option<&Projection>,
    ) -> QueryResult<impl Iterator<Item = QueryResult<Document>>> {
        let projection = projection.map(Projection::to_document);
        let cursor = self
            .collection
            .find(filter, projection.as_ref(), None)
            .map_err(self.failed())?;

        let name = Arc::clone(&self.name);
        Ok(cursor.map(move |item| {
            item.map_err(|e| QueryError::pipeline_execution(name.as_ref(), e))
        }))
    }

    /// Returns the first matching document
    pub fn find_one(&self, filter: &Document) -> QueryResult<Option<Document>> {
        let mut cursor = self
            .collection
            .find(filter, None, Some(1))
            .map_err(self.failed())?;
        cursor.next().transpose().map_err(self.failed())
    }

    /// Inserts documents, returning their ids
    pub fn insert_many(&self, documents: Vec<Document>) -> QueryResult<Vec<Value>> {
        self.collection.insert_many(documents).map_err(self.failed())
    }

    /// Updates the document matching every `criteria` field with
    /// `defaults`, creating it when none matches.
    ///
    /// Returns the document as it was before the update; `None` when it
    /// was created.
    pub fn update_or_create(
        &self,
        defaults: Document,
        criteria: Document,
    ) -> QueryResult<Option<Document>> {
        let filter: Document = criteria
            .into_iter()
            .map(|(field, value)| (field, json!({ "$eq": value })))
            .collect();

        let mut update = Document::new();
        update.insert("$set".to_string(), Value::Object(defaults));

        let before = self
            .collection
            .find_one_and_update(&filter, &update, true)
            .map_err(self.failed())?;

        self.metrics.increment_upserts();
        log_event(
            Event::UpsertApplied,
            &[
                ("collection", self.name()),
                ("created", if before.is_none() { "true" } else { "false" }),
            ],
        );

        Ok(before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::ProjectionBuilder;
    use crate::store::{DocumentStore, MemoryStore};

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn context(store: &MemoryStore) -> DayCollection<crate::store::MemoryCollection> {
        DayCollection::new(store.collection("2024-01-01"), Arc::new(MetricsRegistry::new()))
    }

    #[test]
    fn test_insert_count_find() {
        let store = MemoryStore::new();
        let col = context(&store);

        let ids = col
            .insert_many(vec![doc(json!({"t": "a"})), doc(json!({"t": "b"}))])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(col.count().unwrap(), 2);
        assert_eq!(col.count_matching(&doc(json!({"t": "b"}))).unwrap(), 1);

        let projection = ProjectionBuilder::build(["t"], ["_id"]);
        let found: Vec<_> = col
            .find(&Document::new(), projection.as_ref())
            .unwrap()
            .collect::<QueryResult<_>>()
            .unwrap();
        assert_eq!(found, vec![doc(json!({"t": "a"})), doc(json!({"t": "b"}))]);
    }

    #[test]
    fn test_find_one() {
        let store = MemoryStore::new();
        let col = context(&store);
        assert!(col.find_one(&Document::new()).unwrap().is_none());

        col.insert_many(vec![doc(json!({"t": "a"}))]).unwrap();
        let found = col.find_one(&doc(json!({"t": "a"}))).unwrap().unwrap();
        assert_eq!(found.get("t"), Some(&json!("a")));
    }

    #[test]
    fn test_update_or_create() {
        let store = MemoryStore::new();
        let col = context(&store);

        let before = col
            .update_or_create(doc(json!({"views": 1})), doc(json!({"url": "/a"})))
            .unwrap();
        assert!(before.is_none());

        let before = col
            .update_or_create(doc(json!({"views": 2})), doc(json!({"url": "/a"})))
            .unwrap()
            .unwrap();
        assert_eq!(before.get("views"), Some(&json!(1)));

        assert_eq!(col.count().unwrap(), 1);
        let now = col.find_one(&doc(json!({"url": "/a"}))).unwrap().unwrap();
        assert_eq!(now.get("views"), Some(&json!(2)));
        assert_eq!(col.metrics.snapshot().upserts, 2);
    }

    #[test]
    fn test_criteria_values_match_literally() {
        let store = MemoryStore::new();
        let col = context(&store);

        // an operator-looking criteria value is compared as a value
        col.update_or_create(doc(json!({"n": 1})), doc(json!({"tag": {"$gt": 1}})))
            .unwrap();
        let created = col.find_one(&Document::new()).unwrap().unwrap();
        assert_eq!(created.get("tag"), Some(&json!({"$gt": 1})));
    }

    #[test]
    fn test_errors_name_collection() {
        let store = MemoryStore::new();
        let col = context(&store);
        store.disconnect();

        let err = col.count().unwrap_err();
        assert_eq!(err.collection(), Some("2024-01-01"));
    }
}
