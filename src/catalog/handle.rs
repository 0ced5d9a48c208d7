//! Collection references and handles

use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use crate::dates::Day;
use crate::errors::{QueryError, QueryResult};
use crate::store::{Document, DocumentStore, StoreCollection};

/// A collection named by the caller or already bound to the store
#[derive(Debug, Clone)]
pub enum CollectionRef<C> {
    /// Collection name, bound on use
    ByName(String),
    /// Already bound handle
    ByHandle(C),
}

impl<C: StoreCollection> CollectionRef<C> {
    /// Binds the reference against a store
    pub fn bind<S>(self, store: &S) -> C
    where
        S: DocumentStore<Collection = C>,
    {
        match self {
            CollectionRef::ByName(name) => store.collection(&name),
            CollectionRef::ByHandle(handle) => handle,
        }
    }

    /// Returns the collection name
    pub fn name(&self) -> &str {
        match self {
            CollectionRef::ByName(name) => name,
            CollectionRef::ByHandle(handle) => handle.name(),
        }
    }
}

impl<C> From<&str> for CollectionRef<C> {
    fn from(name: &str) -> Self {
        CollectionRef::ByName(name.to_string())
    }
}

impl<C> From<String> for CollectionRef<C> {
    fn from(name: String) -> Self {
        CollectionRef::ByName(name)
    }
}

impl<C> From<Day> for CollectionRef<C> {
    fn from(day: Day) -> Self {
        CollectionRef::ByName(day.collection_name())
    }
}

/// A day-collection bound for one query.
///
/// The document count is fetched at most once per handle.
pub struct CollectionHandle<C> {
    day: Day,
    name: Arc<str>,
    collection: C,
    count: OnceCell<u64>,
}

impl<C: StoreCollection> CollectionHandle<C> {
    /// Binds a handle for a day
    pub fn new(day: Day, collection: C) -> Self {
        Self {
            day,
            name: Arc::from(collection.name()),
            collection,
            count: OnceCell::new(),
        }
    }

    pub fn day(&self) -> Day {
        self.day
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the shared collection name
    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Returns the bound store collection
    pub fn collection(&self) -> &C {
        &self.collection
    }

    /// Returns the document count, fetching it on first use
    pub fn count(&self) -> QueryResult<u64> {
        if let Some(count) = self.count.get() {
            return Ok(*count);
        }
        let count = self
            .collection
            .count_documents(&Document::new())
            .map_err(|e| QueryError::collection_count(self.name.as_ref(), e))?;
        Ok(*self.count.get_or_init(|| count))
    }

    /// Returns the count if it has been fetched
    pub fn cached_count(&self) -> Option<u64> {
        self.count.get().copied()
    }
}

impl<C> fmt::Debug for CollectionHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionHandle")
            .field("day", &self.day)
            .field("name", &self.name)
            .field("count", &self.count.get())
            .finish()
    }
}
