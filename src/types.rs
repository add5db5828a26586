//! Error type shared by the crop and overlay components.

use crate::imaging::{ParamError, RenderError};
use thiserror::Error;

/// Failure of a composition operation.
///
/// Either kind is recoverable by re-issuing the operation with corrected
/// inputs. No partially drawn image is ever returned alongside an error.
#[derive(Error, Debug)]
pub enum ComposeError {
    /// Rejected before any drawing was attempted.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Decoding, surface acquisition, font resolution or encoding failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<ParamError> for ComposeError {
    fn from(err: ParamError) -> Self {
        ComposeError::InvalidInput(err.to_string())
    }
}

impl ComposeError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ComposeError::InvalidInput(_))
    }
}

/// Result type for composition operations.
pub type Result<T> = std::result::Result<T, ComposeError>;
