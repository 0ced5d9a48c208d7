//! Cross-collection distinct values

use std::collections::{HashSet, VecDeque};

use serde_json::Value;

use crate::errors::QueryResult;
use crate::executor::Documents;
use crate::store::{values, StoreCollection};

/// Group key produced by the per-collection `$group` stage
pub(crate) const GROUP_KEY: &str = "_id";

/// Lazy sequence of distinct field values across collections.
///
/// Array values are flattened into their elements; null and missing
/// values are skipped. Each value is yielded once, in first-seen order.
pub struct Distinct<C> {
    groups: Documents<C>,
    seen: HashSet<String>,
    pending: VecDeque<Value>,
}

impl<C: StoreCollection> Distinct<C> {
    pub(crate) fn new(groups: Documents<C>) -> Self {
        Self {
            groups,
            seen: HashSet::new(),
            pending: VecDeque::new(),
        }
    }

    fn push_candidates(&mut self, value: Value) {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if !item.is_null() {
                        self.pending.push_back(item);
                    }
                }
            }
            other => self.pending.push_back(other),
        }
    }
}

impl<C: StoreCollection> Iterator for Distinct<C> {
    type Item = QueryResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(value) = self.pending.pop_front() {
                if self.seen.insert(values::value_key(&value)) {
                    return Some(Ok(value));
                }
            }

            match self.groups.next()? {
                Ok(mut item) => {
                    let key = item.document.remove(GROUP_KEY).unwrap_or(Value::Null);
                    self.push_candidates(key);
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
