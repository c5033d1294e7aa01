//! # Document Store
//!
//! The engine reaches the store only through [`DocumentStore`] and the
//! bounded [`SessionPool`]. [`InMemoryStore`] evaluates a subset of the
//! aggregation language over documents held in memory.

pub mod errors;
pub mod matcher;
pub mod memory;
pub mod pipeline;
pub mod pool;

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::definition::Command;

pub use errors::{StoreError, StoreResult};
pub use matcher::DocumentMatcher;
pub use memory::InMemoryStore;
pub use pipeline::run_pipeline;
pub use pool::{SessionPool, StoreSession};

/// Future returned by [`DocumentStore::aggregate`]
pub type StoreFuture<'a> = Pin<Box<dyn Future<Output = StoreResult<Vec<Value>>> + Send + 'a>>;

/// Aggregation backend
pub trait DocumentStore: Send + Sync {
    /// Run `pipeline` against `collection` and return the resulting documents
    fn aggregate<'a>(&'a self, collection: &'a str, pipeline: &'a [Command]) -> StoreFuture<'a>;
}
