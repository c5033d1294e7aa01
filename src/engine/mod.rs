//! # Set Execution Engine
//!
//! [`SetExecutor`] runs a set's queries in order through [`QueryRunner`],
//! chaining results via saved-result placeholders and masking returned
//! output.

pub mod context;
pub mod errors;
pub mod executor;
pub mod result;
pub mod runner;

pub use context::{CancelToken, ExecutionContext};
pub use errors::{ErrorCategory, ExecError, ExecResult};
pub use executor::{ExecOptions, SetExecutor};
pub use result::{QueryResult, SetResult};
pub use runner::{check_step, split_save, QueryRunner, Step};
