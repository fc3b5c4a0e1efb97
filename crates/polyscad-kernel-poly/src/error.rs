//! Error types for polyhedron and polygon construction.

use polyscad_ir::Loc;
use thiserror::Error;

/// Errors raised while building polyhedra and polygons.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolyError {
    /// A face contains an edge whose endpoints are the same point.
    #[error("degenerate edge in face")]
    DegenerateEdge {
        /// Source position of the offending point reference.
        loc: Loc,
    },

    /// The same directed edge appears in two faces (non-manifold).
    #[error("edge duplicated in the same direction")]
    DuplicateEdge {
        /// Source position of the first occurrence.
        loc: Loc,
        /// Source position of the second occurrence.
        loc2: Loc,
    },

    /// An edge is used by more than two faces.
    #[error("edge used by more than two faces")]
    EdgeOverused {
        /// Source position of the offending edge.
        loc: Loc,
    },

    /// An edge has no reverse partner (hole in the surface).
    #[error("unpaired edge")]
    UnpairedEdge {
        /// Source position of the orphaned edge.
        loc: Loc,
    },

    /// A face has fewer than three points.
    #[error("face with fewer than 3 points")]
    SmallFace {
        /// Source position of the face.
        loc: Loc,
    },

    /// Construction-algorithm invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for polyhedron construction.
pub type Result<T> = std::result::Result<T, PolyError>;
