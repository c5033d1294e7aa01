//! # Definition Registry
//!
//! In-memory catalogue of sets, scripts, regexes and masks. Upserts replace
//! any existing definition with the same key.

use std::collections::HashMap;
use std::sync::RwLock;

use regex::Regex;

use super::errors::{DefinitionError, DefinitionResult};
use super::lookup::{MaskLookup, RegexLookup, ScriptLookup, SetLookup};
use super::types::{Mask, RegexDef, Script, Set, ANY_COLLECTION};

fn poisoned() -> DefinitionError {
    DefinitionError::Internal("Lock poisoned".into())
}

/// Registry of every definition the engine can consult
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    /// Sets by name
    sets: RwLock<HashMap<String, Set>>,

    /// Scripts by name
    scripts: RwLock<HashMap<String, Script>>,

    /// Compiled regexes by name
    regexes: RwLock<HashMap<String, Regex>>,

    /// Masks keyed by (collection, field)
    masks: RwLock<HashMap<(String, String), Mask>>,
}

impl DefinitionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a set after structural validation
    pub fn upsert_set(&self, set: Set) -> DefinitionResult<()> {
        set.validate()?;
        let mut sets = self.sets.write().map_err(|_| poisoned())?;
        sets.insert(set.name.clone(), set);
        Ok(())
    }

    /// Register or replace a script after structural validation
    pub fn upsert_script(&self, script: Script) -> DefinitionResult<()> {
        script.validate()?;
        let mut scripts = self.scripts.write().map_err(|_| poisoned())?;
        scripts.insert(script.name.clone(), script);
        Ok(())
    }

    /// Compile and register a regex
    pub fn upsert_regex(&self, def: RegexDef) -> DefinitionResult<()> {
        let compiled = Regex::new(&def.expr).map_err(|e| DefinitionError::InvalidRegex {
            name: def.name.clone(),
            reason: e.to_string(),
        })?;
        let mut regexes = self.regexes.write().map_err(|_| poisoned())?;
        regexes.insert(def.name, compiled);
        Ok(())
    }

    /// Register or replace a mask
    pub fn upsert_mask(&self, mask: Mask) -> DefinitionResult<()> {
        if mask.collection.is_empty() || mask.field.is_empty() {
            return Err(DefinitionError::InvalidMask {
                collection: mask.collection,
                field: mask.field,
                reason: "collection and field are required".into(),
            });
        }
        let mut masks = self.masks.write().map_err(|_| poisoned())?;
        masks.insert((mask.collection.clone(), mask.field.clone()), mask);
        Ok(())
    }

    /// Names of all registered sets, sorted
    pub fn set_names(&self) -> DefinitionResult<Vec<String>> {
        let sets = self.sets.read().map_err(|_| poisoned())?;
        let mut names: Vec<String> = sets.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Every registered mask, ordered by collection then field
    pub fn masks(&self) -> DefinitionResult<Vec<Mask>> {
        let masks = self.masks.read().map_err(|_| poisoned())?;
        let mut masks: Vec<Mask> = masks.values().cloned().collect();
        masks.sort_by(|a, b| (&a.collection, &a.field).cmp(&(&b.collection, &b.field)));
        Ok(masks)
    }

    /// Describe every regex or script a set names that is not registered.
    ///
    /// Empty when the catalogue is self-consistent.
    pub fn unresolved_references(&self) -> DefinitionResult<Vec<String>> {
        let sets = self.sets.read().map_err(|_| poisoned())?;
        let scripts = self.scripts.read().map_err(|_| poisoned())?;
        let regexes = self.regexes.read().map_err(|_| poisoned())?;

        let mut names: Vec<&String> = sets.keys().collect();
        names.sort();

        let mut problems = Vec::new();
        for set in names.into_iter().filter_map(|n| sets.get(n)) {
            for param in &set.params {
                if let Some(regex) = param.regex_name.as_deref().filter(|r| !r.is_empty()) {
                    if !regexes.contains_key(regex) {
                        problems.push(format!(
                            "set \"{}\": param \"{}\" uses unknown regex \"{}\"",
                            set.name, param.name, regex
                        ));
                    }
                }
            }
            for script in [set.pre_script(), set.post_script()].into_iter().flatten() {
                if !scripts.contains_key(script) {
                    problems.push(format!(
                        "set \"{}\": unknown script \"{}\"",
                        set.name, script
                    ));
                }
            }
        }
        Ok(problems)
    }

    /// Count of (sets, scripts, regexes, masks)
    pub fn counts(&self) -> DefinitionResult<(usize, usize, usize, usize)> {
        Ok((
            self.sets.read().map_err(|_| poisoned())?.len(),
            self.scripts.read().map_err(|_| poisoned())?.len(),
            self.regexes.read().map_err(|_| poisoned())?.len(),
            self.masks.read().map_err(|_| poisoned())?.len(),
        ))
    }
}

impl SetLookup for DefinitionRegistry {
    fn set_by_name(&self, name: &str) -> DefinitionResult<Set> {
        let sets = self.sets.read().map_err(|_| poisoned())?;
        sets.get(name)
            .cloned()
            .ok_or_else(|| DefinitionError::not_found("Set", name))
    }
}

impl ScriptLookup for DefinitionRegistry {
    fn script_by_name(&self, name: &str) -> DefinitionResult<Script> {
        let scripts = self.scripts.read().map_err(|_| poisoned())?;
        scripts
            .get(name)
            .cloned()
            .ok_or_else(|| DefinitionError::not_found("Script", name))
    }
}

impl RegexLookup for DefinitionRegistry {
    fn regex_by_name(&self, name: &str) -> DefinitionResult<Regex> {
        let regexes = self.regexes.read().map_err(|_| poisoned())?;
        regexes
            .get(name)
            .cloned()
            .ok_or_else(|| DefinitionError::not_found("Regex", name))
    }
}

impl MaskLookup for DefinitionRegistry {
    fn masks_for_collection(&self, collection: &str) -> DefinitionResult<HashMap<String, Mask>> {
        let masks = self.masks.read().map_err(|_| poisoned())?;

        // Collection-specific masks win over wildcard masks on the same field
        let mut by_field = HashMap::new();
        for mask in masks.values().filter(|m| m.collection == ANY_COLLECTION) {
            by_field.insert(mask.field.clone(), mask.clone());
        }
        for mask in masks.values().filter(|m| m.collection == collection) {
            by_field.insert(mask.field.clone(), mask.clone());
        }
        Ok(by_field)
    }
}
