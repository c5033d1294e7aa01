//! # Parameter Validation

pub mod errors;
pub mod validator;

pub use errors::{ParamError, ParamResult};
pub use validator::ParamValidator;
