//! In-memory document store
//!
//! Reference backend for the query layer. Collections live in a shared map
//! behind `Arc<RwLock<..>>`, so clones of a `MemoryStore` see the same data.
//!
//! Besides the store capability it offers fault injection
//! (`disconnect`, `fail_collection`) and a dispatch log recording every
//! find/aggregate issued, which lets callers observe fan-out behavior.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use super::{matcher, pipeline, project, update};
use super::{document, documents, Document, DocumentStore, StoreCollection};

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<String, Vec<Document>>,
    failing: BTreeSet<String>,
    offline: bool,
}

/// Shared in-memory document store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
    dispatched: Arc<Mutex<Vec<String>>>,
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("store lock poisoned".into())
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a store from a directory of `<collection>.json` files.
    ///
    /// Each file holds a JSON array of documents.
    pub fn load_dir(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let store = Self::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = fs::read_to_string(&path)?;
            let docs = documents(serde_json::from_str(&content)?)?;
            store.collection(name).insert_many(docs)?;
        }
        Ok(store)
    }

    /// Creates an empty collection if it does not exist
    pub fn create_collection(&self, name: &str) -> StoreResult<()> {
        self.write()?.collections.entry(name.to_string()).or_default();
        Ok(())
    }

    /// Inserts JSON objects into a collection, creating it if needed
    pub fn insert_values(
        &self,
        name: &str,
        values: impl IntoIterator<Item = Value>,
    ) -> StoreResult<Vec<Value>> {
        let docs = values
            .into_iter()
            .map(document)
            .collect::<StoreResult<Vec<_>>>()?;
        self.collection(name).insert_many(docs)
    }

    /// Drops a collection, returning whether it existed
    pub fn drop_collection(&self, name: &str) -> StoreResult<bool> {
        Ok(self.write()?.collections.remove(name).is_some())
    }

    /// Makes every operation fail with `Unavailable`
    pub fn disconnect(&self) {
        if let Ok(mut state) = self.state.write() {
            state.offline = true;
        }
    }

    /// Restores availability after `disconnect`
    pub fn reconnect(&self) {
        if let Ok(mut state) = self.state.write() {
            state.offline = false;
        }
    }

    /// Makes find/aggregate on one collection fail
    pub fn fail_collection(&self, name: &str) {
        if let Ok(mut state) = self.state.write() {
            state.failing.insert(name.to_string());
        }
    }

    /// Clears a failure set by `fail_collection`
    pub fn heal_collection(&self, name: &str) {
        if let Ok(mut state) = self.state.write() {
            state.failing.remove(name);
        }
    }

    /// Collections queried by find/aggregate, in dispatch order
    pub fn dispatch_log(&self) -> Vec<String> {
        self.dispatched
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Clears the dispatch log
    pub fn clear_dispatch_log(&self) {
        if let Ok(mut log) = self.dispatched.lock() {
            log.clear();
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        if state.offline {
            return Err(StoreError::Unavailable("store is disconnected".into()));
        }
        Ok(state)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        let state = self.state.write().map_err(|_| poisoned())?;
        if state.offline {
            return Err(StoreError::Unavailable("store is disconnected".into()));
        }
        Ok(state)
    }

    fn record_dispatch(&self, name: &str) {
        if let Ok(mut log) = self.dispatched.lock() {
            log.push(name.to_string());
        }
    }

    /// Snapshot of a collection for a query, honoring injected failures
    fn query_snapshot(&self, name: &str) -> StoreResult<Vec<Document>> {
        let state = self.read()?;
        if state.failing.contains(name) {
            return Err(StoreError::Backend(format!(
                "injected failure on collection '{}'",
                name
            )));
        }
        Ok(state.collections.get(name).cloned().unwrap_or_default())
    }
}

impl DocumentStore for MemoryStore {
    type Collection = MemoryCollection;

    fn list_collection_names(&self) -> StoreResult<BTreeSet<String>> {
        Ok(self.read()?.collections.keys().cloned().collect())
    }

    fn collection(&self, name: &str) -> MemoryCollection {
        MemoryCollection {
            name: name.to_string(),
            store: self.clone(),
        }
    }
}

/// Handle to one collection of a `MemoryStore`
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    store: MemoryStore,
}

/// Cursor over materialized in-memory results
#[derive(Debug)]
pub struct MemoryCursor {
    inner: std::vec::IntoIter<Document>,
}

impl MemoryCursor {
    fn new(documents: Vec<Document>) -> Self {
        Self {
            inner: documents.into_iter(),
        }
    }
}

impl Iterator for MemoryCursor {
    type Item = StoreResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

fn ensure_id(doc: &mut Document) -> Value {
    doc.entry("_id".to_string())
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()))
        .clone()
}

impl StoreCollection for MemoryCollection {
    type Cursor = MemoryCursor;

    fn name(&self) -> &str {
        &self.name
    }

    fn count_documents(&self, filter: &Document) -> StoreResult<u64> {
        let state = self.store.read()?;
        let Some(docs) = state.collections.get(&self.name) else {
            return Ok(0);
        };

        let mut count = 0;
        for doc in docs {
            if matcher::matches(doc, filter)? {
                count += 1;
            }
        }
        Ok(count)
    }

    fn find(
        &self,
        filter: &Document,
        projection: Option<&Document>,
        limit: Option<u64>,
    ) -> StoreResult<MemoryCursor> {
        if let Some(p) = projection {
            project::validate(p)?;
        }
        self.store.record_dispatch(&self.name);

        let limit = limit.map(|n| n as usize).unwrap_or(usize::MAX);
        let mut out = Vec::new();
        for doc in self.store.query_snapshot(&self.name)? {
            if out.len() >= limit {
                break;
            }
            if matcher::matches(&doc, filter)? {
                out.push(match projection {
                    Some(p) => project::apply(&doc, p)?,
                    None => doc,
                });
            }
        }

        Ok(MemoryCursor::new(out))
    }

    fn aggregate(&self, stages: &[Document]) -> StoreResult<MemoryCursor> {
        pipeline::validate(stages)?;
        self.store.record_dispatch(&self.name);

        let docs = self.store.query_snapshot(&self.name)?;
        Ok(MemoryCursor::new(pipeline::run(docs, stages)?))
    }

    fn find_one_and_update(
        &self,
        filter: &Document,
        changes: &Document,
        upsert: bool,
    ) -> StoreResult<Option<Document>> {
        update::validate(changes)?;

        let mut state = self.store.write()?;
        let docs = state.collections.entry(self.name.clone()).or_default();

        let mut position = None;
        for (i, doc) in docs.iter().enumerate() {
            if matcher::matches(doc, filter)? {
                position = Some(i);
                break;
            }
        }

        match position {
            Some(i) => {
                let before = docs[i].clone();
                update::apply(&mut docs[i], changes, false)?;
                Ok(Some(before))
            }
            None if upsert => {
                let mut created = update::seed_from_filter(filter);
                update::apply(&mut created, changes, true)?;
                ensure_id(&mut created);
                docs.push(created);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn insert_many(&self, documents: Vec<Document>) -> StoreResult<Vec<Value>> {
        let mut state = self.store.write()?;
        let docs = state.collections.entry(self.name.clone()).or_default();

        let mut ids = Vec::with_capacity(documents.len());
        for mut doc in documents {
            ids.push(ensure_id(&mut doc));
            docs.push(doc);
        }
        Ok(ids)
    }
}
