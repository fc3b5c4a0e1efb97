//! Edge pairing — deriving the canonical edge array from face loops.
//!
//! Every directed edge of every face must be matched by exactly one
//! reverse directed edge elsewhere; success establishes that the mesh is
//! a closed two-manifold surface.

use crate::error::{PolyError, Result};
use crate::{Edge, EdgeId, Face, FaceId, PointId, Polyhedron, Vertex3};

/// One directed face edge in the scratch array.
#[derive(Debug, Clone, Copy)]
struct Scratch {
    lo: PointId,
    hi: PointId,
    /// Whether the face traverses lo → hi.
    fwd: bool,
    loc: polyscad_ir::Loc,
}

/// Build a polyhedron from points and face loops, deriving and pairing
/// the edge array.
///
/// The algorithm (per face loop, with wrap-around):
/// 1. emit a scratch entry per directed edge, keyed by the unordered pair;
/// 2. sort; two identical entries means an edge duplicated in the same
///    direction — non-manifold, rejected;
/// 3. collapse the sorted scratch into the canonical edge array (half the
///    scratch size for a closed surface);
/// 4. binary-search each directed face edge back into the canonical array,
///    assigning the face to the `fore` or `back` slot;
/// 5. verify every edge ends up with both slots filled.
pub fn build_polyhedron(
    points: Vec<Vertex3>,
    mut faces: Vec<Face>,
    rect_rot: bool,
) -> Result<Polyhedron> {
    for face in &faces {
        if face.points.len() < 3 {
            return Err(PolyError::SmallFace { loc: face.loc });
        }
    }

    let mut scratch = Vec::with_capacity(faces.iter().map(|f| f.points.len()).sum());
    for face in &faces {
        let n = face.points.len();
        for i in 0..n {
            let a = face.points[i];
            let b = face.points[(i + 1) % n];
            if a.point == b.point {
                return Err(PolyError::DegenerateEdge { loc: a.loc });
            }
            let (lo, hi, fwd) = if a.point < b.point {
                (a.point, b.point, true)
            } else {
                (b.point, a.point, false)
            };
            scratch.push(Scratch {
                lo,
                hi,
                fwd,
                loc: a.loc,
            });
        }
    }

    scratch.sort_by_key(|s| (s.lo, s.hi, s.fwd));
    for w in scratch.windows(2) {
        if w[0].lo == w[1].lo && w[0].hi == w[1].hi && w[0].fwd == w[1].fwd {
            return Err(PolyError::DuplicateEdge {
                loc: w[0].loc,
                loc2: w[1].loc,
            });
        }
    }

    // Unique unordered pairs become the canonical edge array.
    let mut edges: Vec<Edge> = Vec::with_capacity(scratch.len() / 2);
    for s in &scratch {
        let last = edges.last();
        if last.map_or(true, |e| (e.src, e.dst) != (s.lo, s.hi)) {
            edges.push(Edge {
                src: s.lo,
                dst: s.hi,
                fore: None,
                back: None,
                loc: s.loc,
            });
        }
    }

    // Wire face -> edge references and edge -> face back-references.
    for (fi, face) in faces.iter_mut().enumerate() {
        let fid = FaceId(fi as u32);
        let n = face.points.len();
        face.edges.clear();
        for i in 0..n {
            let a = face.points[i];
            let b = face.points[(i + 1) % n];
            let (lo, hi) = if a.point < b.point {
                (a.point, b.point)
            } else {
                (b.point, a.point)
            };
            let ei = edges
                .binary_search_by_key(&(lo, hi), |e| (e.src, e.dst))
                .map_err(|_| PolyError::Internal("edge bsearch miss".into()))?;
            let slot = if a.point == lo {
                &mut edges[ei].fore
            } else {
                &mut edges[ei].back
            };
            if slot.is_some() {
                return Err(PolyError::EdgeOverused { loc: a.loc });
            }
            *slot = Some(fid);
            face.edges.push(EdgeId(ei as u32));
        }
    }

    for e in &edges {
        if e.fore.is_none() || e.back.is_none() {
            return Err(PolyError::UnpairedEdge { loc: e.loc });
        }
    }

    Ok(Polyhedron {
        points,
        faces,
        edges,
        rect_rot,
    })
}
