//! # Definition Errors

use thiserror::Error;

use super::types::StageProblem;

/// Result type for definition operations
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// Errors raised while validating, registering or looking up definitions
#[derive(Debug, Clone, Error)]
pub enum DefinitionError {
    #[error("Invalid set \"{set}\": {reason}")]
    InvalidSet { set: String, reason: String },

    /// A query whose commands cannot run. Displays the query-level message.
    #[error("{reason}")]
    InvalidQuery {
        set: String,
        query: String,
        reason: String,
    },

    #[error("Invalid script \"{name}\": {reason}")]
    InvalidScript { name: String, reason: String },

    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: &'static str, name: String },

    #[error("Invalid regex \"{name}\": {reason}")]
    InvalidRegex { name: String, reason: String },

    #[error("Invalid mask for \"{collection}.{field}\": {reason}")]
    InvalidMask {
        collection: String,
        field: String,
        reason: String,
    },

    #[error("Malformed definition file '{path}': {reason}")]
    Malformed { path: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DefinitionError {
    /// Create an invalid set error
    pub fn invalid_set(set: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSet {
            set: set.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid query error from a command-list problem
    pub fn invalid_query(
        set: impl Into<String>,
        query: impl Into<String>,
        problem: StageProblem,
    ) -> Self {
        let query = query.into();
        Self::InvalidQuery {
            set: set.into(),
            reason: problem.describe(&query),
            query,
        }
    }

    /// Create an invalid script error
    pub fn invalid_script(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidScript {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error for the given definition kind
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create a malformed file error
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for lookups that found nothing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidSet { .. } => 400,
            Self::InvalidQuery { .. } => 400,
            Self::InvalidScript { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::InvalidRegex { .. } => 400,
            Self::InvalidMask { .. } => 400,
            Self::Malformed { .. } => 500,
            Self::Internal(_) => 500,
        }
    }
}
