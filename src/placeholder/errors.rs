//! # Placeholder Errors

use thiserror::Error;

/// Result type for placeholder parsing and resolution
pub type PlaceholderResult<T> = Result<T, PlaceholderError>;

/// Errors raised while parsing or resolving a placeholder token
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaceholderError {
    #[error("Malformed placeholder \"{0}\"")]
    Malformed(String),

    #[error("Unknown placeholder command \"{0}\"")]
    UnknownCommand(String),

    #[error("Missing operator for data placeholder \"{0}\"")]
    MissingOperator(String),

    #[error("Invalid data operator \"{op}\" in placeholder \"{token}\"")]
    InvalidOperator { op: String, token: String },

    #[error("Invalid data reference \"{0}\", expected <key>.<field>")]
    InvalidDataReference(String),

    #[error("Invalid number value \"{0}\"")]
    InvalidNumber(String),

    #[error("Invalid date value \"{0}\"")]
    InvalidDate(String),

    #[error("Invalid objectid value \"{0}\"")]
    InvalidObjectId(String),

    #[error("Key \"{0}\" not found in saved results")]
    KeyNotFound(String),

    /// The saved entry holds something other than documents. Always fatal.
    #[error("Saved results \"{0}\" are not a document list")]
    NotDocumentList(String),

    #[error("No saved results under \"{0}\"")]
    EmptyResults(String),

    #[error("Index \"{index}\" out of range, total \"{total}\"")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("Field \"{field}\" not found in saved results \"{key}\"")]
    FieldNotFound { field: String, key: String },

    #[error("Placeholder \"{0}\" in $in must reference saved data")]
    InvalidInPlaceholder(String),

    /// The substituted value would itself read as a placeholder
    #[error("Placeholder \"{token}\" resolved to \"{value}\", values may not start with '#'")]
    PlaceholderLikeValue { token: String, value: String },
}

impl PlaceholderError {
    /// True when the error must abort the execution regardless of `Continue`
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotDocumentList(_))
    }
}
