//! Document store capability
//!
//! The query layer consumes a document store through two traits:
//!
//! - [`DocumentStore`]: lists collections and binds collection handles
//! - [`StoreCollection`]: count, find, aggregate and single-document upsert
//!   on one collection
//!
//! Filters, projections, updates and pipeline stages are MongoDB-style
//! JSON documents. [`MemoryStore`] is the in-process reference backend;
//! `MongoStore` (feature `mongodb`) talks to a MongoDB server.

mod errors;
mod matcher;
mod memory;
pub mod pipeline;
pub mod project;
pub mod update;
mod uri;
pub mod values;

#[cfg(feature = "mongodb")]
mod mongo;

use std::collections::BTreeSet;

use serde_json::Value;

pub use errors::{StoreError, StoreResult};
pub use matcher::matches;
pub use memory::{MemoryCollection, MemoryCursor, MemoryStore};
pub use uri::{ConnectionString, Scheme};

#[cfg(feature = "mongodb")]
pub use mongo::{MongoCollection, MongoCursor, MongoStore};

/// A JSON document
pub type Document = serde_json::Map<String, Value>;

/// Converts a JSON value into a document.
///
/// Fails unless the value is an object.
pub fn document(value: Value) -> StoreResult<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidFilter(format!(
            "expected a document, got {}",
            other
        ))),
    }
}

/// Converts a JSON array of objects into a list of documents
pub fn documents(value: Value) -> StoreResult<Vec<Document>> {
    match value {
        Value::Array(items) => items.into_iter().map(document).collect(),
        other => Err(StoreError::InvalidPipeline(format!(
            "expected an array of documents, got {}",
            other
        ))),
    }
}

/// A document store holding named collections
pub trait DocumentStore {
    /// Collection handle type
    type Collection: StoreCollection;

    /// Lists the names of all existing collections
    fn list_collection_names(&self) -> StoreResult<BTreeSet<String>>;

    /// Binds a handle to a collection by name.
    ///
    /// Binding is lazy: no round-trip happens until the handle is used.
    fn collection(&self, name: &str) -> Self::Collection;
}

/// Operations on a single collection
pub trait StoreCollection {
    /// Cursor over query results; dropping it releases the server cursor
    type Cursor: Iterator<Item = StoreResult<Document>>;

    /// Returns the collection name
    fn name(&self) -> &str;

    /// Counts documents matching a filter
    fn count_documents(&self, filter: &Document) -> StoreResult<u64>;

    /// Finds documents matching a filter, optionally projected and limited
    fn find(
        &self,
        filter: &Document,
        projection: Option<&Document>,
        limit: Option<u64>,
    ) -> StoreResult<Self::Cursor>;

    /// Runs an aggregation pipeline
    fn aggregate(&self, pipeline: &[Document]) -> StoreResult<Self::Cursor>;

    /// Updates the first matching document, inserting one when `upsert`
    /// is set and nothing matches.
    ///
    /// Returns the document as it was before the update.
    fn find_one_and_update(
        &self,
        filter: &Document,
        update: &Document,
        upsert: bool,
    ) -> StoreResult<Option<Document>>;

    /// Inserts documents, returning their `_id` values
    fn insert_many(&self, documents: Vec<Document>) -> StoreResult<Vec<Value>>;
}
