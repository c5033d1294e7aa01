//! In-memory document store
//!
//! Collections are plain document lists. Aggregation clones the collection
//! under a read lock and evaluates the pipeline over the copy.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use serde_json::Value;
use tracing::debug;

use super::errors::{StoreError, StoreResult};
use super::pipeline::run_pipeline;
use super::{DocumentStore, StoreFuture};
use crate::definition::Command;

/// Document store backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document to a collection, creating it if needed
    pub fn insert(&self, collection: &str, document: Value) -> StoreResult<()> {
        self.insert_many(collection, vec![document])
    }

    /// Append documents to a collection, creating it if needed
    pub fn insert_many(&self, collection: &str, documents: Vec<Value>) -> StoreResult<()> {
        if let Some(bad) = documents.iter().position(|d| !d.is_object()) {
            return Err(StoreError::Internal(format!(
                "document {} for collection \"{}\" is not an object",
                bad, collection
            )));
        }
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        Ok(())
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Seed collections from `<dir>/<collection>.json` files.
    ///
    /// Each file must hold a JSON array of documents. Returns the number of
    /// collections loaded.
    pub fn load_dir(&self, dir: &Path) -> StoreResult<usize> {
        let load_err = |path: &Path, reason: String| StoreError::Load {
            path: path.display().to_string(),
            reason,
        };

        let entries = fs::read_dir(dir)
            .map_err(|e| load_err(dir, format!("Failed to read directory: {}", e)))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| load_err(dir, format!("Failed to read directory entry: {}", e)))?
                .path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| load_err(path, "Invalid file name".into()))?;

            let content = fs::read_to_string(path)
                .map_err(|e| load_err(path, format!("Failed to read file: {}", e)))?;
            let docs: Vec<Value> = serde_json::from_str(&content)
                .map_err(|e| load_err(path, format!("Invalid JSON: {}", e)))?;

            debug!(collection = name, documents = docs.len(), "collection loaded");
            self.insert_many(name, docs)?;
        }

        Ok(paths.len())
    }

    fn run(&self, collection: &str, pipeline: &[Command]) -> StoreResult<Vec<Value>> {
        let docs = {
            let collections = self
                .collections
                .read()
                .map_err(|_| StoreError::Internal("Lock poisoned".into()))?;
            collections.get(collection).cloned().unwrap_or_default()
        };
        run_pipeline(docs, pipeline)
    }
}

impl DocumentStore for InMemoryStore {
    fn aggregate<'a>(&'a self, collection: &'a str, pipeline: &'a [Command]) -> StoreFuture<'a> {
        Box::pin(std::future::ready(self.run(collection, pipeline)))
    }
}
