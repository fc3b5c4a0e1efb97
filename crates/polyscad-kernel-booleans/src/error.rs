//! Error type for the boolean engine.

use thiserror::Error;

/// Errors raised by the plane sweep.
///
/// All variants are algorithmic invariant violations, not user-input
/// problems — valid polygons never trigger them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoolError {
    /// Sweep invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for boolean operations.
pub type Result<T> = std::result::Result<T, BoolError>;
