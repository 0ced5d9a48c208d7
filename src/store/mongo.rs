//! MongoDB store backend
//!
//! Uses the blocking driver API. Documents cross the boundary as relaxed
//! extended JSON, so `ObjectId` and dates surface as `{"$oid": ..}` and
//! `{"$date": ..}` objects.

use std::collections::BTreeSet;

use mongodb::bson::{self, Bson};
use mongodb::error::{Error as DriverError, ErrorKind};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::sync::{Client, Collection, Cursor, Database};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::uri::{ConnectionString, Scheme};
use super::{Document, DocumentStore, StoreCollection};
use crate::errors::{QueryError, QueryResult};

impl From<DriverError> for StoreError {
    fn from(e: DriverError) -> Self {
        match *e.kind {
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            _ => StoreError::Backend(e.to_string()),
        }
    }
}

fn to_bson(doc: &Document) -> StoreResult<bson::Document> {
    bson::to_document(doc).map_err(|e| StoreError::Backend(format!("BSON encoding: {}", e)))
}

fn to_json(doc: bson::Document) -> StoreResult<Document> {
    match Bson::Document(doc).into_relaxed_extjson() {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!(
            "expected a document from the server, got {}",
            other
        ))),
    }
}

/// Document store backed by a MongoDB database
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
    uri: ConnectionString,
}

impl MongoStore {
    /// Connects to the database named in the connection string.
    ///
    /// The driver connects lazily; an unreachable server surfaces on the
    /// first operation as `Unavailable`.
    pub fn connect(uri: &ConnectionString) -> QueryResult<Self> {
        if uri.scheme() == Scheme::Memory {
            return Err(QueryError::configuration(
                "memory:// connection strings cannot open a MongoDB store",
            ));
        }
        let client = Client::with_uri_str(uri.as_str()).map_err(|e| {
            QueryError::configuration(format!("Invalid connection string '{}': {}", uri, e))
        })?;

        Ok(Self {
            database: client.database(uri.database()),
            uri: uri.clone(),
        })
    }

    pub fn uri(&self) -> &ConnectionString {
        &self.uri
    }
}

impl DocumentStore for MongoStore {
    type Collection = MongoCollection;

    fn list_collection_names(&self) -> StoreResult<BTreeSet<String>> {
        Ok(self
            .database
            .list_collection_names(None)?
            .into_iter()
            .collect())
    }

    fn collection(&self, name: &str) -> MongoCollection {
        MongoCollection {
            name: name.to_string(),
            inner: self.database.collection(name),
        }
    }
}

/// Handle to one MongoDB collection
#[derive(Debug, Clone)]
pub struct MongoCollection {
    name: String,
    inner: Collection<bson::Document>,
}

/// Server cursor converting documents to JSON
#[derive(Debug)]
pub struct MongoCursor {
    inner: Cursor<bson::Document>,
}

impl Iterator for MongoCursor {
    type Item = StoreResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|item| item.map_err(StoreError::from).and_then(to_json))
    }
}

impl StoreCollection for MongoCollection {
    type Cursor = MongoCursor;

    fn name(&self) -> &str {
        &self.name
    }

    fn count_documents(&self, filter: &Document) -> StoreResult<u64> {
        Ok(self.inner.count_documents(to_bson(filter)?, None)?)
    }

    fn find(
        &self,
        filter: &Document,
        projection: Option<&Document>,
        limit: Option<u64>,
    ) -> StoreResult<MongoCursor> {
        let mut options = FindOptions::default();
        options.projection = projection.map(to_bson).transpose()?;
        options.limit = limit.map(|n| n as i64);

        Ok(MongoCursor {
            inner: self.inner.find(to_bson(filter)?, options)?,
        })
    }

    fn aggregate(&self, pipeline: &[Document]) -> StoreResult<MongoCursor> {
        let stages = pipeline
            .iter()
            .map(to_bson)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(MongoCursor {
            inner: self.inner.aggregate(stages, None)?,
        })
    }

    fn find_one_and_update(
        &self,
        filter: &Document,
        update: &Document,
        upsert: bool,
    ) -> StoreResult<Option<Document>> {
        let mut options = FindOneAndUpdateOptions::default();
        options.upsert = Some(upsert);
        options.return_document = Some(ReturnDocument::Before);

        self.inner
            .find_one_and_update(to_bson(filter)?, to_bson(update)?, options)?
            .map(to_json)
            .transpose()
    }

    fn insert_many(&self, documents: Vec<Document>) -> StoreResult<Vec<Value>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let docs = documents
            .iter()
            .map(to_bson)
            .collect::<StoreResult<Vec<_>>>()?;
        let count = docs.len();

        let result = self.inner.insert_many(docs, None)?;
        Ok((0..count)
            .filter_map(|i| result.inserted_ids.get(&i).cloned())
            .map(Bson::into_relaxed_extjson)
            .collect())
    }
}
