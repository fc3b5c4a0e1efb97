//! Error types for CSG lowering.

use polyscad_ir::Loc;
use polyscad_kernel_booleans::BoolError;
use polyscad_kernel_poly::PolyError;
use thiserror::Error;

/// Errors raised while lowering a SCAD tree into CSG geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CsgError {
    /// The diagnostic sink asked to abort.
    #[error("aborted by diagnostic sink")]
    Aborted,

    /// Empty geometry with fatal severity configured.
    #[error("empty geometry")]
    Empty {
        /// Source position.
        loc: Loc,
    },

    /// A transform collapses a dimension.
    #[error("transform collapses geometry")]
    Collapse {
        /// Source position.
        loc: Loc,
    },

    /// A 2D primitive outside a 2D context.
    #[error("2D object used outside a 2D context")]
    Outside2d {
        /// Source position.
        loc: Loc,
    },

    /// A 3D primitive inside a 2D context.
    #[error("3D object used inside a 2D context")]
    Outside3d {
        /// Source position.
        loc: Loc,
    },

    /// Two polyhedron points share coordinates.
    #[error("duplicate point in polyhedron")]
    DuplicatePoint {
        /// Source position of the first point.
        loc: Loc,
        /// Source position of the second point.
        loc2: Loc,
    },

    /// Polyhedron with too few points or faces.
    #[error("polyhedron needs at least 4 points and 4 faces")]
    DegeneratePolyhedron {
        /// Source position.
        loc: Loc,
    },

    /// A face or path index is out of range.
    #[error("index out of range")]
    BadIndex {
        /// Source position.
        loc: Loc,
    },

    /// A construct the kernel refuses to model.
    #[error("unsupported: {msg}")]
    Unsupported {
        /// Source position.
        loc: Loc,
        /// What is unsupported.
        msg: String,
    },

    /// Invalid mesh topology (always fatal).
    #[error(transparent)]
    Topology(#[from] PolyError),

    /// Boolean engine failure.
    #[error(transparent)]
    Bool(#[from] BoolError),

    /// Lowering invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for CSG lowering.
pub type Result<T> = std::result::Result<T, CsgError>;
