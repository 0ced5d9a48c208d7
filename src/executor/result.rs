//! Result types for fan-out execution

use std::sync::Arc;

use serde_json::Value;

use crate::dates::Day;
use crate::store::Document;

/// Documents returned by one collection of a fan-out
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionBatch {
    collection: Arc<str>,
    day: Day,
    documents: Vec<Document>,
}

impl CollectionBatch {
    pub fn new(collection: Arc<str>, day: Day, documents: Vec<Document>) -> Self {
        Self {
            collection,
            day,
            documents,
        }
    }

    /// Source collection name
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn day(&self) -> Day {
        self.day
    }

    /// Number of documents this collection yielded; charged to the budget
    pub fn matched(&self) -> u64 {
        self.documents.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    pub fn into_parts(self) -> (Arc<str>, Vec<Document>) {
        (self.collection, self.documents)
    }

    /// Splits the batch into one item per document
    pub fn into_items(self) -> impl Iterator<Item = ResultItem> {
        let collection = self.collection;
        self.documents.into_iter().map(move |document| ResultItem {
            document,
            collection: Arc::clone(&collection),
        })
    }
}

/// One document with its source collection
#[derive(Debug, Clone, PartialEq)]
pub struct ResultItem {
    pub document: Document,
    pub collection: Arc<str>,
}

impl ResultItem {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// The pair as `{"collection": .., "document": ..}`
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "collection": self.collection.as_ref(),
            "document": Value::Object(self.document.clone()),
        })
    }
}
