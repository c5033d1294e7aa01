//! queryset - a deterministic execution engine for parameterized, chained
//! aggregation query sets
//!
//! A set is an ordered list of pipeline queries. Before each query runs its
//! commands are scanned for typed placeholders (`#number:id`,
//! `#data.*:stations.station_id`, ...) which are resolved from the caller's
//! variables or from results saved by earlier queries. Returned output is
//! masked per collection and field.

pub mod cli;
pub mod definition;
pub mod engine;
pub mod http_server;
pub mod masking;
pub mod observability;
pub mod params;
pub mod placeholder;
pub mod store;

pub use definition::{DefinitionRegistry, Query, Set};
pub use engine::{ExecError, ExecOptions, ExecutionContext, SetExecutor, SetResult};
pub use store::{DocumentStore, InMemoryStore, SessionPool};
