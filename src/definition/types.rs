//! Definition types: sets, queries, params, scripts, regexes and masks
//!
//! Definitions are produced outside the engine and are read-only to it.
//! A set never changes while it is being executed.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{DefinitionError, DefinitionResult};

/// One pipeline stage: an arbitrary key -> value mapping
pub type Command = Map<String, Value>;

/// Pseudo-stage recording a step's output for later placeholders
pub const SAVE_STAGE: &str = "$save";

/// Key inside the `$save` body naming the saved entry
pub const SAVE_MAP_KEY: &str = "$map";

/// Why a command list cannot run as a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageProblem {
    /// Nothing left to submit once `$save` is removed
    NoCommands,
    /// `$save` appears before the last stage
    SaveNotLast,
    /// `$save` is not exactly `{"$save": {"$map": "<key>"}}`
    MalformedSave,
}

impl StageProblem {
    /// Caller-visible message for the step named `step`
    pub fn describe(&self, step: &str) -> String {
        format!("Invalid query \"{}\", {}", step, self)
    }
}

impl fmt::Display for StageProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageProblem::NoCommands => write!(f, "no commands to execute"),
            StageProblem::SaveNotLast => write!(f, "{} must be the last stage", SAVE_STAGE),
            StageProblem::MalformedSave => write!(
                f,
                "{} stage must be {{\"{}\": {{\"{}\": \"<key>\"}}}}",
                SAVE_STAGE, SAVE_STAGE, SAVE_MAP_KEY
            ),
        }
    }
}

/// Save key of a trailing `$save` stage, if the commands end with one.
///
/// Only the shape is checked, so this holds before and after placeholder
/// substitution.
pub fn save_key(commands: &[Command]) -> Result<Option<&str>, StageProblem> {
    let Some(pos) = commands.iter().position(|c| c.contains_key(SAVE_STAGE)) else {
        return Ok(None);
    };
    if pos + 1 != commands.len() {
        return Err(StageProblem::SaveNotLast);
    }

    let stage = &commands[pos];
    if stage.len() != 1 {
        return Err(StageProblem::MalformedSave);
    }

    stage
        .get(SAVE_STAGE)
        .and_then(Value::as_object)
        .filter(|body| body.len() == 1)
        .and_then(|body| body.get(SAVE_MAP_KEY))
        .and_then(Value::as_str)
        .filter(|key| !key.is_empty())
        .map(Some)
        .ok_or(StageProblem::MalformedSave)
}

/// Check that `commands` leave a non-empty pipeline with at most one
/// well-formed trailing `$save`
pub fn check_commands(commands: &[Command]) -> Result<(), StageProblem> {
    let saved = save_key(commands)?;
    if commands.len() == usize::from(saved.is_some()) {
        return Err(StageProblem::NoCommands);
    }
    Ok(())
}

/// A named, versioned collection of queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Set {
    /// Unique set name
    pub name: String,

    /// Free text description
    #[serde(default)]
    pub description: String,

    /// Definition version
    #[serde(default = "default_version")]
    pub version: u32,

    /// A disabled set never executes
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Declared parameters, in order
    #[serde(default)]
    pub params: Vec<Param>,

    /// Script run before the first query
    #[serde(default)]
    pub pre_script: Option<String>,

    /// Script run after the last query
    #[serde(default)]
    pub post_script: Option<String>,

    /// Queries, executed strictly in this order
    #[serde(default)]
    pub queries: Vec<Query>,
}

fn default_version() -> u32 {
    1
}

fn default_enabled() -> bool {
    true
}

impl Set {
    /// Create an enabled set with no params or scripts
    pub fn new(name: impl Into<String>, queries: Vec<Query>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: default_version(),
            enabled: true,
            params: Vec::new(),
            pre_script: None,
            post_script: None,
            queries,
        }
    }

    /// Add a parameter declaration
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Set the pre-script name
    pub fn with_pre_script(mut self, name: impl Into<String>) -> Self {
        self.pre_script = Some(name.into());
        self
    }

    /// Set the post-script name
    pub fn with_post_script(mut self, name: impl Into<String>) -> Self {
        self.post_script = Some(name.into());
        self
    }

    /// Disable the set
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Pre-script name, if one is declared
    pub fn pre_script(&self) -> Option<&str> {
        self.pre_script.as_deref().filter(|s| !s.is_empty())
    }

    /// Post-script name, if one is declared
    pub fn post_script(&self) -> Option<&str> {
        self.post_script.as_deref().filter(|s| !s.is_empty())
    }

    /// Structural validation.
    ///
    /// Checks names, param uniqueness and that every query can run. Does
    /// not look at `enabled`; callers gate on that separately.
    pub fn validate(&self) -> DefinitionResult<()> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::invalid_set("", "set name is required"));
        }

        if self.queries.is_empty() {
            return Err(DefinitionError::invalid_set(&self.name, "no queries declared"));
        }

        let mut seen = HashSet::new();
        for param in &self.params {
            if param.name.trim().is_empty() {
                return Err(DefinitionError::invalid_set(
                    &self.name,
                    "param name is required",
                ));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(DefinitionError::invalid_set(
                    &self.name,
                    format!("param \"{}\" declared twice", param.name),
                ));
            }
        }

        for query in &self.queries {
            query.validate(&self.name)?;
        }

        Ok(())
    }
}

/// The kind of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Aggregation pipeline against one collection
    #[default]
    Pipeline,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Pipeline => "pipeline",
        }
    }
}

/// One step of a set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Label used in results
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "type", default)]
    pub kind: QueryKind,

    /// Target collection
    pub collection: String,

    /// Pipeline stages, may end with a `$save` pseudo-stage
    #[serde(default)]
    pub commands: Vec<Command>,

    /// Include this query's output in the final result
    #[serde(rename = "return", default)]
    pub return_results: bool,

    /// On failure, move on to the next query instead of aborting
    #[serde(rename = "continue", default)]
    pub continue_on_error: bool,
}

impl Query {
    /// Create a pipeline query
    pub fn pipeline(
        name: impl Into<String>,
        collection: impl Into<String>,
        commands: Vec<Command>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: QueryKind::Pipeline,
            collection: collection.into(),
            commands,
            return_results: false,
            continue_on_error: false,
        }
    }

    /// Include the output in the final result
    pub fn returning(mut self) -> Self {
        self.return_results = true;
        self
    }

    /// Continue with the next query when this one fails
    pub fn continuing(mut self) -> Self {
        self.continue_on_error = true;
        self
    }

    fn validate(&self, set: &str) -> DefinitionResult<()> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::invalid_set(set, "query name is required"));
        }
        if self.collection.trim().is_empty() {
            return Err(DefinitionError::invalid_set(
                set,
                format!("query \"{}\" has no collection", self.name),
            ));
        }
        match self.kind {
            QueryKind::Pipeline => check_commands(&self.commands)
                .map_err(|problem| DefinitionError::invalid_query(set, &self.name, problem)),
        }
    }
}

/// A declared input variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Key expected in the caller's variables
    pub name: String,

    #[serde(default)]
    pub desc: String,

    /// Value used when the caller omits the variable
    #[serde(default)]
    pub default: Option<String>,

    /// Named regex the value must match
    #[serde(default)]
    pub regex_name: Option<String>,
}

impl Param {
    /// A required parameter with no default and no regex
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: String::new(),
            default: None,
            regex_name: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_regex(mut self, regex_name: impl Into<String>) -> Self {
        self.regex_name = Some(regex_name.into());
        self
    }
}

/// Commands run before or after a set's queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Collection the script's pipeline runs against
    pub collection: String,

    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Script {
    pub fn new(
        name: impl Into<String>,
        collection: impl Into<String>,
        commands: Vec<Command>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            collection: collection.into(),
            commands,
        }
    }

    /// Structural validation, same rules as a query's commands
    pub fn validate(&self) -> DefinitionResult<()> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::Internal("script name is required".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(DefinitionError::invalid_script(&self.name, "no collection"));
        }
        check_commands(&self.commands)
            .map_err(|problem| DefinitionError::invalid_script(&self.name, problem.to_string()))
    }
}

/// A named regular expression, stored as source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegexDef {
    pub name: String,
    pub expr: String,
}

impl RegexDef {
    pub fn new(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expr: expr.into(),
        }
    }
}

/// Collection name that makes a mask apply everywhere
pub const ANY_COLLECTION: &str = "*";

/// A per-collection, per-field redaction rule
///
/// The mask type is kept as written; it is parsed when masks are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    pub collection: String,
    pub field: String,
    #[serde(rename = "type")]
    pub mask_type: String,
}

impl Mask {
    pub fn new(
        collection: impl Into<String>,
        field: impl Into<String>,
        mask_type: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            mask_type: mask_type.into(),
        }
    }
}
