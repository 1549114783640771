//! Equality selectors over dotted JSON paths, and query pages.

use std::collections::BTreeMap;

use serde_json::Value;

/// A conjunction of `path == value` predicates.
///
/// Paths are dotted (`body.holderPublicKey`). A stored value that is not
/// valid JSON matches only the empty selector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    predicates: BTreeMap<String, Value>,
}

impl Selector {
    /// The empty selector, matching every key.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an equality predicate.
    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.insert(path.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Evaluate against raw stored bytes.
    pub fn matches(&self, raw: &[u8]) -> bool {
        if self.predicates.is_empty() {
            return true;
        }
        let Ok(doc) = serde_json::from_slice::<Value>(raw) else {
            return false;
        };
        self.predicates
            .iter()
            .all(|(path, expected)| lookup(&doc, path) == Some(expected))
    }
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |node, segment| node.get(segment))
}

/// One key/value pair from a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// One page of selector results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPage {
    pub results: Vec<KeyValue>,
    /// Continuation for the next page; `None` when the result set is
    /// exhausted.
    pub bookmark: Option<String>,
    /// Number of records in this page.
    pub count: usize,
}
