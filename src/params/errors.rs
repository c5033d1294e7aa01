//! # Parameter Errors

use thiserror::Error;

use crate::definition::DefinitionError;

/// Result type for parameter validation
pub type ParamResult<T> = Result<T, ParamError>;

/// Errors raised while reconciling declared params with caller variables
#[derive(Debug, Clone, Error)]
pub enum ParamError {
    /// Every param still missing after defaults were applied
    #[error("Variables [{}] were not included with the call", .0.join(" "))]
    Missing(Vec<String>),

    #[error("Regex \"{regex}\" for param \"{param}\" not found")]
    RegexNotFound { param: String, regex: String },

    #[error("Param \"{param}\" value \"{value}\" does not match regex \"{regex}\"")]
    NoMatch {
        param: String,
        value: String,
        regex: String,
    },

    #[error(transparent)]
    Lookup(#[from] DefinitionError),
}
