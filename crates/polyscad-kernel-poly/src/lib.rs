#![warn(missing_docs)]

//! Polyhedron topology and 2D polygon types for the polyscad kernel.
//!
//! A [`Polyhedron`] owns three append-only vectors — points, faces, edges —
//! with all cross-references expressed as typed indices, so the edge ↔ face
//! cycle never needs owning pointers. The edge array is derived from the
//! faces by the pairing pass in [`build`], which also establishes the
//! two-faces-per-edge invariant.

pub mod build;
pub mod error;
pub mod polygon;
pub mod triangulate;

pub use build::build_polyhedron;
pub use error::{PolyError, Result};
pub use polygon::{Path2, Polygon2, Vertex2};
pub use triangulate::{ring_is_convex, ring_signed_area, EarClip, FaceTriangulator};

use polyscad_ir::Loc;
use polyscad_kernel_math::Point3;

/// Index of a point in its owning polyhedron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId(pub u32);

/// Index of a face in its owning polyhedron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceId(pub u32);

/// Index of an edge in its owning polyhedron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub u32);

/// A 3D point with its source position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex3 {
    /// Coordinate.
    pub coord: Point3,
    /// Source position (diagnostics only).
    pub loc: Loc,
}

impl Vertex3 {
    /// Create a vertex.
    pub fn new(coord: Point3, loc: Loc) -> Self {
        Self { coord, loc }
    }
}

/// A reference from a face to a point, with its own source position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRef {
    /// The referenced point.
    pub point: PointId,
    /// Source position of this reference.
    pub loc: Loc,
}

impl PointRef {
    /// Create a point reference.
    pub fn new(point: PointId, loc: Loc) -> Self {
        Self { point, loc }
    }
}

/// A face: a loop of point references and the parallel loop of edges.
///
/// `edges[i]` is the edge from `points[i]` to `points[i + 1]` (wrapping).
/// Faces are convex or have been produced by triangulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Point loop.
    pub points: Vec<PointRef>,
    /// Edge loop, parallel to `points`; filled by edge pairing.
    pub edges: Vec<EdgeId>,
    /// Source position of the face.
    pub loc: Loc,
}

impl Face {
    /// Create a face from a point loop (edges filled by pairing).
    pub fn new(points: Vec<PointRef>, loc: Loc) -> Self {
        Self {
            points,
            edges: Vec::new(),
            loc,
        }
    }

    /// Reverse the winding of this face in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
        // edges are refilled by pairing; a built face also rotates its
        // edge loop so edges stay parallel to points
        if !self.edges.is_empty() {
            self.edges.reverse();
            self.edges.rotate_left(1);
        }
    }
}

/// An unordered edge, canonicalized so `src < dst`, with back-references
/// to the two faces sharing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Smaller endpoint.
    pub src: PointId,
    /// Larger endpoint.
    pub dst: PointId,
    /// Face traversing src → dst.
    pub fore: Option<FaceId>,
    /// Face traversing dst → src.
    pub back: Option<FaceId>,
    /// Source position of the first face reference that created the edge.
    pub loc: Loc,
}

/// A watertight polyhedral mesh.
///
/// The three vectors are never resized once building completes; all
/// cross-links are indices into them.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyhedron {
    /// Point vector.
    pub points: Vec<Vertex3>,
    /// Face vector.
    pub faces: Vec<Face>,
    /// Edge vector (derived, canonical form).
    pub edges: Vec<Edge>,
    /// Whether the construction matrix was a pure rectangular rotation
    /// (downstream axis-aligned output optimization).
    pub rect_rot: bool,
}

impl Polyhedron {
    /// Coordinate of a point.
    pub fn coord(&self, id: PointId) -> &Point3 {
        &self.points[id.0 as usize].coord
    }

    /// Look up a face.
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.0 as usize]
    }

    /// Look up an edge.
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0 as usize]
    }

    /// Verify the two-manifold invariant (used by tests and debug checks).
    pub fn check_manifold(&self) -> Result<()> {
        for e in &self.edges {
            if e.fore.is_none() || e.back.is_none() {
                return Err(PolyError::UnpairedEdge { loc: e.loc });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyscad_ir::Loc;
    use polyscad_kernel_math::Point3;

    fn pr(i: u32) -> PointRef {
        PointRef::new(PointId(i), Loc::NONE)
    }

    #[test]
    fn face_reverse_keeps_edge_alignment() {
        // A built tetrahedron face with a parallel edge loop
        let mut face = Face::new(vec![pr(0), pr(1), pr(2)], Loc::NONE);
        face.edges = vec![EdgeId(0), EdgeId(1), EdgeId(2)];
        face.reverse();
        // points: 2,1,0; edge from points[0]=2 to points[1]=1 is edge 1
        assert_eq!(face.points[0].point, PointId(2));
        assert_eq!(face.edges, vec![EdgeId(1), EdgeId(0), EdgeId(2)]);
    }

    #[test]
    fn vertex_holds_loc() {
        let v = Vertex3::new(Point3::new(1.0, 2.0, 3.0), Loc(5));
        assert_eq!(v.loc, Loc(5));
    }
}
