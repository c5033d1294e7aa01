//! # Result Masking
//!
//! Redacts sensitive fields from caller-visible query output. Masking is
//! applied to the returned copy only; saved results stay raw.

pub mod errors;
pub mod mask;
pub mod processor;

pub use errors::{MaskError, MaskResult};
pub use mask::{MaskType, DEFAULT_REVEAL, REDACTED};
pub use processor::MaskProcessor;
