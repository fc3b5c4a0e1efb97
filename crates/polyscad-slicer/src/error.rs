//! Error types for the slicer.

use polyscad_kernel_csg::CsgError;
use thiserror::Error;

/// Errors that can occur during slicing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlicerError {
    /// The model lowers to nothing.
    #[error("model is empty")]
    EmptyModel,

    /// Invalid slice settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Failure in the CSG or boolean machinery.
    #[error(transparent)]
    Csg(#[from] CsgError),
}

/// Result type for slicer operations.
pub type Result<T> = std::result::Result<T, SlicerError>;
