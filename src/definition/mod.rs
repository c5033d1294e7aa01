//! # Definitions
//!
//! Sets, queries, params, scripts, regexes and masks, plus the lookup
//! traits the engine reads them through and an in-memory registry that
//! implements those traits.

pub mod errors;
pub mod loader;
pub mod lookup;
pub mod registry;
pub mod types;

pub use errors::{DefinitionError, DefinitionResult};
pub use loader::{DefinitionLoader, LoadSummary};
pub use lookup::{MaskLookup, RegexLookup, ScriptLookup, SetLookup};
pub use registry::DefinitionRegistry;
pub use types::{
    check_commands, save_key, Command, Mask, Param, Query, QueryKind, RegexDef, Script, Set,
    StageProblem, ANY_COLLECTION, SAVE_MAP_KEY, SAVE_STAGE,
};
