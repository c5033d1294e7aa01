//! Definition loader for reading definitions from disk at startup
//!
//! Layout under the definitions directory:
//! - `sets/*.json`
//! - `scripts/*.json`
//! - `regexes/*.json`
//! - `masks/*.json`
//!
//! Each file holds either a single definition object or an array of them.
//! A missing subdirectory means no definitions of that kind. A malformed
//! file aborts the load.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::errors::{DefinitionError, DefinitionResult};
use super::registry::DefinitionRegistry;
use super::types::{Mask, RegexDef, Script, Set};

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Number of definitions loaded per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub sets: usize,
    pub scripts: usize,
    pub regexes: usize,
    pub masks: usize,
}

/// Loads definition files into a [`DefinitionRegistry`]
pub struct DefinitionLoader {
    root: PathBuf,
}

impl DefinitionLoader {
    /// Creates a loader rooted at the definitions directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the definitions directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads every definition kind into `registry`.
    ///
    /// Regexes load before sets so a set never sees a half-built catalogue.
    pub fn load_into(&self, registry: &DefinitionRegistry) -> DefinitionResult<LoadSummary> {
        if !self.root.is_dir() {
            return Err(DefinitionError::malformed(
                self.root.display().to_string(),
                "definitions directory does not exist",
            ));
        }

        let mut summary = LoadSummary::default();

        for def in self.read_kind::<RegexDef>("regexes")? {
            registry.upsert_regex(def)?;
            summary.regexes += 1;
        }
        for mask in self.read_kind::<Mask>("masks")? {
            registry.upsert_mask(mask)?;
            summary.masks += 1;
        }
        for script in self.read_kind::<Script>("scripts")? {
            registry.upsert_script(script)?;
            summary.scripts += 1;
        }
        for set in self.read_kind::<Set>("sets")? {
            registry.upsert_set(set)?;
            summary.sets += 1;
        }

        debug!(
            sets = summary.sets,
            scripts = summary.scripts,
            regexes = summary.regexes,
            masks = summary.masks,
            "definitions loaded"
        );

        Ok(summary)
    }

    fn read_kind<T: DeserializeOwned>(&self, subdir: &str) -> DefinitionResult<Vec<T>> {
        let dir = self.root.join(subdir);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        for path in json_files(&dir)? {
            let content = fs::read_to_string(&path).map_err(|e| {
                DefinitionError::malformed(
                    path.display().to_string(),
                    format!("Failed to read file: {}", e),
                )
            })?;

            let parsed: OneOrMany<T> = serde_json::from_str(&content).map_err(|e| {
                DefinitionError::malformed(
                    path.display().to_string(),
                    format!("Invalid JSON: {}", e),
                )
            })?;

            items.extend(parsed.into_vec());
        }

        Ok(items)
    }
}

/// JSON files directly under `dir`, sorted by path
pub(crate) fn json_files(dir: &Path) -> DefinitionResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        DefinitionError::malformed(
            dir.display().to_string(),
            format!("Failed to read directory: {}", e),
        )
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            DefinitionError::malformed(
                dir.display().to_string(),
                format!("Failed to read directory entry: {}", e),
            )
        })?;

        let path = entry.path();
        if path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        paths.push(path);
    }

    paths.sort();
    Ok(paths)
}
