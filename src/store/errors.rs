//! # Store Errors

use thiserror::Error;

/// Result type for document store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by document stores and the session pool
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Unsupported pipeline stage \"{0}\"")]
    UnsupportedStage(String),

    #[error("Invalid {stage} stage: {reason}")]
    InvalidStage { stage: String, reason: String },

    #[error("Unsupported operator \"{0}\"")]
    UnsupportedOperator(String),

    #[error("Failed to load collection data from '{path}': {reason}")]
    Load { path: String, reason: String },

    #[error("Session pool is closed")]
    PoolClosed,

    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn invalid_stage(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStage {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the pipeline itself rather than the store
    pub fn is_pipeline_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedStage(_) | Self::InvalidStage { .. } | Self::UnsupportedOperator(_)
        )
    }
}
