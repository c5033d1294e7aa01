//! Execution error types
//!
//! Every failure is classified into a category:
//! - CONFIGURATION: disabled or invalid set, invalid query, missing script
//! - PARAMETER: missing or invalid caller variables
//! - SUBSTITUTION: a placeholder could not be resolved
//! - STORE: the store rejected or failed the pipeline
//! - MASKING: output could not be masked
//! - CANCELLED / DEADLINE: the caller stopped the execution
//!
//! Only substitution and store errors are query-scoped; `Continue` decides
//! whether they abort the set. Everything else aborts it.

use std::fmt;

use thiserror::Error;

use crate::definition::DefinitionError;
use crate::masking::MaskError;
use crate::params::ParamError;
use crate::placeholder::PlaceholderError;
use crate::store::StoreError;

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Parameter,
    Substitution,
    Store,
    Masking,
    Cancelled,
    Deadline,
}

impl ErrorCategory {
    /// Stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "QS_CONFIGURATION",
            ErrorCategory::Parameter => "QS_PARAMETER",
            ErrorCategory::Substitution => "QS_SUBSTITUTION",
            ErrorCategory::Store => "QS_STORE",
            ErrorCategory::Masking => "QS_MASKING",
            ErrorCategory::Cancelled => "QS_CANCELLED",
            ErrorCategory::Deadline => "QS_DEADLINE_EXCEEDED",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Result type for set execution
pub type ExecResult<T> = Result<T, ExecError>;

/// Set execution error.
///
/// The display form is the caller-visible message. Query names are kept
/// as structured context and only reach the logs.
#[derive(Debug, Clone, Error)]
pub enum ExecError {
    #[error("Set \"{0}\" is disabled")]
    SetDisabled(String),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("{reason}")]
    InvalidQuery { query: String, reason: String },

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error("{source}")]
    Substitution {
        query: String,
        source: PlaceholderError,
    },

    #[error("{source}")]
    Store { query: String, source: StoreError },

    #[error("{source}")]
    Mask { query: String, source: MaskError },

    #[error("Execution cancelled")]
    Cancelled,

    #[error("Execution deadline exceeded")]
    DeadlineExceeded,
}

impl ExecError {
    pub fn invalid_query(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            query: query.into(),
            reason: reason.into(),
        }
    }

    pub fn substitution(query: impl Into<String>, source: PlaceholderError) -> Self {
        Self::Substitution {
            query: query.into(),
            source,
        }
    }

    pub fn store(query: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            query: query.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SetDisabled(_) | Self::Definition(_) | Self::InvalidQuery { .. } => {
                ErrorCategory::Configuration
            }
            Self::Param(_) => ErrorCategory::Parameter,
            Self::Substitution { .. } => ErrorCategory::Substitution,
            Self::Store { .. } => ErrorCategory::Store,
            Self::Mask { .. } => ErrorCategory::Masking,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::DeadlineExceeded => ErrorCategory::Deadline,
        }
    }

    /// True when the error aborts the set even if the query has `Continue`
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Substitution { source, .. } => source.is_fatal(),
            Self::Store { source, .. } => matches!(source, StoreError::PoolClosed),
            _ => true,
        }
    }

    pub fn code(&self) -> &'static str {
        self.category().code()
    }

    /// Query the error belongs to, if any
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::InvalidQuery { query, .. }
            | Self::Substitution { query, .. }
            | Self::Store { query, .. }
            | Self::Mask { query, .. }
            | Self::Definition(DefinitionError::InvalidQuery { query, .. }) => Some(query),
            _ => None,
        }
    }

    /// HTTP status for an error result
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Definition(e) => e.status_code(),
            Self::SetDisabled(_) => 403,
            Self::InvalidQuery { .. } | Self::Param(_) | Self::Substitution { .. } => 400,
            Self::Store { source, .. } if source.is_pipeline_error() => 400,
            Self::Store { .. } => 502,
            Self::Mask { .. } => 500,
            Self::Cancelled => 499,
            Self::DeadlineExceeded => 504,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_bare_reason() {
        let err = ExecError::substitution(
            "Lookup",
            PlaceholderError::IndexOutOfRange { index: 8, total: 1 },
        );
        assert_eq!(err.to_string(), "Index \"8\" out of range, total \"1\"");
        assert_eq!(err.query(), Some("Lookup"));
        assert_eq!(err.category(), ErrorCategory::Substitution);
    }

    #[test]
    fn test_query_scoped_errors_not_fatal() {
        let err = ExecError::substitution("q", PlaceholderError::KeyNotFound("k".into()));
        assert!(!err.is_fatal());

        let err = ExecError::store("q", StoreError::UnsupportedStage("$lookup".into()));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_fatal_errors() {
        assert!(ExecError::Cancelled.is_fatal());
        assert!(ExecError::DeadlineExceeded.is_fatal());
        assert!(ExecError::SetDisabled("s".into()).is_fatal());
        assert!(ExecError::invalid_query("q", "bad").is_fatal());
        assert!(ExecError::substitution("q", PlaceholderError::NotDocumentList("k".into())).is_fatal());
        assert!(ExecError::store("q", StoreError::PoolClosed).is_fatal());
    }

    #[test]
    fn test_store_status_depends_on_cause() {
        let rejected = ExecError::store("q", StoreError::UnsupportedStage("$lookup".into()));
        assert_eq!(rejected.status_code(), 400);
        assert_eq!(ExecError::store("q", StoreError::PoolClosed).status_code(), 502);
    }

    #[test]
    fn test_param_error_passes_through() {
        let err: ExecError = ParamError::Missing(vec!["station_id".into()]).into();
        assert_eq!(
            err.to_string(),
            "Variables [station_id] were not included with the call"
        );
        assert_eq!(err.code(), "QS_PARAMETER");
        assert_eq!(err.status_code(), 400);
    }
}
