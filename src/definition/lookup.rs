//! Collaborator traits the engine reads definitions through
//!
//! The engine never owns definitions. Anything that can answer these
//! lookups (the in-memory registry, a database-backed catalogue) can be
//! injected into the executor.

use std::collections::HashMap;

use regex::Regex;

use super::errors::DefinitionResult;
use super::types::{Mask, Script, Set};

/// Named regular expressions used by parameter validation
pub trait RegexLookup: Send + Sync {
    /// Compiled regex registered under `name`
    fn regex_by_name(&self, name: &str) -> DefinitionResult<Regex>;
}

/// Pre/post scripts referenced by sets
pub trait ScriptLookup: Send + Sync {
    fn script_by_name(&self, name: &str) -> DefinitionResult<Script>;
}

/// Field masks, keyed by field name, for one collection
pub trait MaskLookup: Send + Sync {
    /// Masks that apply to `collection`, including wildcard masks.
    ///
    /// A collection with no masks yields an empty map, not an error.
    fn masks_for_collection(&self, collection: &str) -> DefinitionResult<HashMap<String, Mask>>;
}

/// Set definitions by name
pub trait SetLookup: Send + Sync {
    fn set_by_name(&self, name: &str) -> DefinitionResult<Set>;
}
