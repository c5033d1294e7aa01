//! Execution-scoped saved results

use std::collections::HashMap;

use serde_json::Value;

/// Results recorded by `$save` stages, keyed by the caller-chosen name.
///
/// Created empty for each execution and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct SavedResults {
    entries: HashMap<String, Vec<Value>>,
}

impl SavedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `docs` under `key`, replacing any earlier entry
    pub fn insert(&mut self, key: impl Into<String>, docs: Vec<Value>) {
        self.entries.insert(key.into(), docs);
    }

    pub fn get(&self, key: &str) -> Option<&[Value]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Value at a dotted field path inside a document
pub fn field_at<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |current, segment| current.as_object()?.get(segment))
}
