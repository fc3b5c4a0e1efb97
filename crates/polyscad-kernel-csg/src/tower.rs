//! Tower construction: polyhedra from stacked cross-section rings.
//!
//! A tower is `fnz` layers of `fn` points each, optionally collapsing
//! into a single apex point on top. The caller populates the (local)
//! point array ring by ring, counter-clockwise viewed from +z; this
//! module generates the faces, applies the transform, and runs edge
//! pairing. Any pairing failure here is a construction bug, not bad
//! user input.

use polyscad_ir::Loc;
use polyscad_kernel_math::{Affine, Point2, Point3};
use polyscad_kernel_poly::{
    build_polyhedron, ring_is_convex, Face, FaceTriangulator, PointId, PointRef, Polyhedron,
};

use crate::error::{CsgError, Result};

/// How side quads are split into triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriSide {
    /// Keep side quads whole (they are planar).
    None,
    /// Split along the bottom-j+1 → top-j diagonal.
    Left,
    /// Split along the bottom-j → top-j+1 diagonal.
    Right,
}

/// Shape parameters of a tower.
#[derive(Debug, Clone, Copy)]
pub struct TowerSpec {
    /// Points per layer (>= 3).
    pub ring: usize,
    /// Number of layers (>= 2, or >= 1 with an apex).
    pub layers: usize,
    /// Whether a single apex point follows the last layer.
    pub apex: bool,
    /// Caller-requested winding reversal (XORed with the transform's
    /// mirror parity).
    pub rev: bool,
    /// Side quad splitting.
    pub tri_side: TriSide,
    /// Check the first/last layer for non-convexity and triangulate the
    /// caps if needed.
    pub may_need_tri: bool,
}

/// Build a tower polyhedron from pre-populated local points.
///
/// `points` holds `ring * layers` coordinates (plus one apex if
/// `spec.apex`), layer by layer. Points are transformed in place by
/// `mat` after face generation; the final winding produces outward
/// normals, with mirroring transforms flipping the winding via the
/// cached determinant sign.
pub fn build_tower(
    mut points: Vec<polyscad_kernel_poly::Vertex3>,
    mat: &Affine,
    spec: &TowerSpec,
    tri: &dyn FaceTriangulator,
    loc: Loc,
) -> Result<Polyhedron> {
    let n = spec.ring;
    let nz = spec.layers;
    let expected = n * nz + usize::from(spec.apex);
    if n < 3 || nz < 1 || (nz < 2 && !spec.apex) || points.len() != expected {
        return Err(CsgError::Internal("tower point count mismatch".into()));
    }

    let idx = |layer: usize, j: usize| (layer * n + (j % n)) as u32;
    let rev_eff = spec.rev ^ mat.is_mirror();

    // Cap triangulation pattern, shared by bottom and top so the two
    // caps stay mirror images of each other.
    let cap_tris = if spec.may_need_tri {
        let ring0: Vec<Point2> = (0..n)
            .map(|j| {
                let c = points[j].coord;
                Point2::new(c.x, c.y)
            })
            .collect();
        if ring_is_convex(&ring0) {
            None
        } else {
            Some(tri.triangulate(&ring0)?)
        }
    } else {
        None
    };

    let mut loops: Vec<Vec<u32>> = Vec::new();

    // Bottom cap: ring 0 reversed so the normal points down.
    match &cap_tris {
        None => loops.push((0..n as u32).rev().collect()),
        Some(tris) => {
            for t in tris {
                loops.push(vec![t[2] as u32, t[1] as u32, t[0] as u32]);
            }
        }
    }

    // Top cap (absent when the tower ends in an apex).
    if !spec.apex {
        let top = nz - 1;
        match &cap_tris {
            None => loops.push((0..n).map(|j| idx(top, j)).collect()),
            Some(tris) => {
                for t in tris {
                    loops.push(vec![idx(top, t[0]), idx(top, t[1]), idx(top, t[2])]);
                }
            }
        }
    }

    // Side bands.
    for k in 0..nz - 1 {
        for j in 0..n {
            let b0 = idx(k, j);
            let b1 = idx(k, j + 1);
            let t1 = idx(k + 1, j + 1);
            let t0 = idx(k + 1, j);
            match spec.tri_side {
                TriSide::None => loops.push(vec![b0, b1, t1, t0]),
                TriSide::Right => {
                    loops.push(vec![b0, b1, t1]);
                    loops.push(vec![b0, t1, t0]);
                }
                TriSide::Left => {
                    loops.push(vec![b0, b1, t0]);
                    loops.push(vec![b1, t1, t0]);
                }
            }
        }
    }

    // Roof fan onto the apex.
    if spec.apex {
        let apex = (n * nz) as u32;
        let top = nz - 1;
        for j in 0..n {
            loops.push(vec![idx(top, j), idx(top, j + 1), apex]);
        }
    }

    if rev_eff {
        for l in &mut loops {
            l.reverse();
        }
    }

    let faces: Vec<Face> = loops
        .into_iter()
        .map(|l| {
            let refs = l
                .iter()
                .map(|&i| PointRef::new(PointId(i), points[i as usize].loc))
                .collect();
            Face::new(refs, loc)
        })
        .collect();

    for v in &mut points {
        v.coord = mat.apply_point(&v.coord);
    }

    build_polyhedron(points, faces, mat.is_rect_rot()).map_err(CsgError::from)
}

/// Outward-pointing area vector of a face (Newell's method); used by
/// tests to verify winding.
pub fn face_normal(poly: &Polyhedron, face: &Face) -> Point3 {
    let mut nx = 0.0;
    let mut ny = 0.0;
    let mut nz = 0.0;
    let m = face.points.len();
    for i in 0..m {
        let a = poly.coord(face.points[i].point);
        let b = poly.coord(face.points[(i + 1) % m].point);
        nx += (a.y - b.y) * (a.z + b.z);
        ny += (a.z - b.z) * (a.x + b.x);
        nz += (a.x - b.x) * (a.y + b.y);
    }
    Point3::new(nx / 2.0, ny / 2.0, nz / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyscad_ir::Loc;
    use polyscad_kernel_math::Vec3;
    use polyscad_kernel_poly::{EarClip, Vertex3};

    fn ring_points(ring: &[(f64, f64)], zs: &[f64]) -> Vec<Vertex3> {
        let mut pts = Vec::new();
        for &z in zs {
            for &(x, y) in ring {
                pts.push(Vertex3::new(Point3::new(x, y, z), Loc::NONE));
            }
        }
        pts
    }

    fn unit_square_ring() -> Vec<(f64, f64)> {
        vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
    }

    fn spec(ring: usize, layers: usize) -> TowerSpec {
        TowerSpec {
            ring,
            layers,
            apex: false,
            rev: false,
            tri_side: TriSide::None,
            may_need_tri: false,
        }
    }

    #[test]
    fn test_cube_tower() {
        let pts = ring_points(&unit_square_ring(), &[0.0, 1.0]);
        let poly =
            build_tower(pts, &Affine::identity(), &spec(4, 2), &EarClip, Loc::NONE).unwrap();
        assert_eq!(poly.points.len(), 8);
        assert_eq!(poly.faces.len(), 6);
        assert_eq!(poly.edges.len(), 12);
        poly.check_manifold().unwrap();
    }

    #[test]
    fn test_outward_normals() {
        let pts = ring_points(&unit_square_ring(), &[0.0, 1.0]);
        let poly =
            build_tower(pts, &Affine::identity(), &spec(4, 2), &EarClip, Loc::NONE).unwrap();
        // Every face normal must point away from the cube center
        let center = Point3::new(0.5, 0.5, 0.5);
        for face in &poly.faces {
            let nrm = face_normal(&poly, face);
            let any = poly.coord(face.points[0].point);
            let outward = (any - center).dot(&nrm.coords);
            assert!(outward > 0.0, "inward-facing normal");
        }
    }

    #[test]
    fn test_mirror_flips_winding() {
        let pts = ring_points(&unit_square_ring(), &[0.0, 1.0]);
        let plain =
            build_tower(pts.clone(), &Affine::identity(), &spec(4, 2), &EarClip, Loc::NONE)
                .unwrap();
        let mirrored = build_tower(
            pts,
            &Affine::mirror(Vec3::new(1.0, 0.0, 0.0)),
            &spec(4, 2),
            &EarClip,
            Loc::NONE,
        )
        .unwrap();
        mirrored.check_manifold().unwrap();
        // Mirrored faces keep outward normals relative to their center
        let center = Point3::new(-0.5, 0.5, 0.5);
        for face in &mirrored.faces {
            let nrm = face_normal(&mirrored, face);
            let any = mirrored.coord(face.points[0].point);
            assert!((any - center).dot(&nrm.coords) > 0.0);
        }
        // but listed in the opposite order from the unmirrored tower
        assert_eq!(plain.faces.len(), mirrored.faces.len());
        assert_ne!(
            plain.faces[0].points[0].point,
            mirrored.faces[0].points[0].point
        );
    }

    #[test]
    fn test_apex_tower() {
        // Square pyramid: one ring plus an apex
        let mut pts = ring_points(&unit_square_ring(), &[0.0]);
        pts.push(Vertex3::new(Point3::new(0.5, 0.5, 1.0), Loc::NONE));
        let s = TowerSpec {
            ring: 4,
            layers: 1,
            apex: true,
            rev: false,
            tri_side: TriSide::None,
            may_need_tri: false,
        };
        let poly = build_tower(pts, &Affine::identity(), &s, &EarClip, Loc::NONE).unwrap();
        assert_eq!(poly.points.len(), 5);
        assert_eq!(poly.faces.len(), 5);
        assert_eq!(poly.edges.len(), 8);
        poly.check_manifold().unwrap();
    }

    #[test]
    fn test_tri_side_splits_quads() {
        let pts = ring_points(&unit_square_ring(), &[0.0, 1.0]);
        let mut s = spec(4, 2);
        s.tri_side = TriSide::Left;
        let poly = build_tower(pts, &Affine::identity(), &s, &EarClip, Loc::NONE).unwrap();
        // 2 caps + 8 side triangles
        assert_eq!(poly.faces.len(), 10);
        poly.check_manifold().unwrap();
    }

    #[test]
    fn test_concave_cap_triangulated() {
        let l_ring = vec![
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
        ];
        let pts = ring_points(&l_ring, &[0.0, 1.0]);
        let mut s = spec(6, 2);
        s.may_need_tri = true;
        let poly = build_tower(pts, &Affine::identity(), &s, &EarClip, Loc::NONE).unwrap();
        // 4 triangles per cap + 6 side quads
        assert_eq!(poly.faces.len(), 14);
        poly.check_manifold().unwrap();
        // Bottom cap triangles point down, top cap triangles point up
        for face in &poly.faces {
            let nrm = face_normal(&poly, face);
            if face.points.len() == 3 {
                assert!(nrm.z.abs() > 1e-9);
            }
        }
    }

    #[test]
    fn test_point_count_mismatch_is_internal() {
        let pts = ring_points(&unit_square_ring(), &[0.0]);
        let err =
            build_tower(pts, &Affine::identity(), &spec(4, 2), &EarClip, Loc::NONE).unwrap_err();
        assert!(matches!(err, CsgError::Internal(_)));
    }
}
