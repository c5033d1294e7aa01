//! # Placeholder Substitution
//!
//! Typed `#<kind>:<ref>` tokens inside command documents are parsed into a
//! small AST and resolved against caller variables or the saved results of
//! earlier queries in the same execution.

pub mod errors;
pub mod node;
pub mod parser;
pub mod resolver;
pub mod saved;
pub mod substitute;

pub use errors::{PlaceholderError, PlaceholderResult};
pub use node::{visit_leaves, Node};
pub use parser::{DataOp, Placeholder, PlaceholderKind};
pub use resolver::Resolver;
pub use saved::{field_at, SavedResults};
pub use substitute::{has_placeholders, substitute_commands, substitute_document};
