//! # Masking Errors

use thiserror::Error;

use crate::definition::DefinitionError;

pub type MaskResult<T> = Result<T, MaskError>;

#[derive(Debug, Clone, Error)]
pub enum MaskError {
    #[error("Unknown mask type \"{mask_type}\" for field \"{field}\"")]
    UnknownType { field: String, mask_type: String },

    #[error("Failed to load masks for collection \"{collection}\": {source}")]
    Lookup {
        collection: String,
        #[source]
        source: DefinitionError,
    },
}
