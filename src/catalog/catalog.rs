//! Day-to-collection resolution
//!
//! Only days whose collection currently exists are retained; querying never
//! creates collections. Each retained handle is counted once and the
//! counts are summed into the fan-out's candidate total.

use crate::dates::Day;
use crate::errors::{QueryError, QueryResult};
use crate::observability::{log_event, Event};
use crate::store::DocumentStore;

use super::handle::CollectionHandle;

/// Existing collections for a set of days, in day order
#[derive(Debug)]
pub struct ResolvedCollections<C> {
    handles: Vec<CollectionHandle<C>>,
    total_documents: u64,
}

impl<C> ResolvedCollections<C> {
    /// An empty resolution
    pub fn empty() -> Self {
        Self {
            handles: Vec::new(),
            total_documents: 0,
        }
    }

    pub fn handles(&self) -> &[CollectionHandle<C>] {
        &self.handles
    }

    /// Sum of the retained collections' document counts
    pub fn total_documents(&self) -> u64 {
        self.total_documents
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn into_parts(self) -> (Vec<CollectionHandle<C>>, u64) {
        (self.handles, self.total_documents)
    }
}

/// Binds days to existing collections of a store
pub struct CollectionCatalog<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> CollectionCatalog<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolves ordered days into handles for the collections that exist.
    ///
    /// Day order is preserved.
    ///
    /// # Errors
    ///
    /// `DAILY_COLLECTION_BIND` when listing or counting fails.
    pub fn resolve_collections(
        &self,
        days: &[Day],
    ) -> QueryResult<ResolvedCollections<S::Collection>> {
        if days.is_empty() {
            return Ok(ResolvedCollections::empty());
        }

        let existing = self
            .store
            .list_collection_names()
            .map_err(QueryError::collection_bind)?;

        let mut handles = Vec::new();
        let mut total_documents = 0u64;

        for day in days {
            let name = day.collection_name();
            if !existing.contains(&name) {
                continue;
            }
            let handle = CollectionHandle::new(*day, self.store.collection(&name));
            total_documents = total_documents.saturating_add(handle.count()?);
            handles.push(handle);
        }

        log_event(
            Event::CatalogResolved,
            &[
                ("days", &days.len().to_string()),
                ("collections", &handles.len().to_string()),
                ("total_documents", &total_documents.to_string()),
            ],
        );

        Ok(ResolvedCollections {
            handles,
            total_documents,
        })
    }
}
