//! 3D primitives: sphere, cube, cylinder/cone, explicit polyhedron.
//!
//! All primitives reject zero-measure inputs via the configurable
//! empty-geometry diagnostic and bake the current transform into their
//! points (only the analytic sphere keeps its matrix).

use polyscad_ir::{Diagnostic, Loc, Severity, Vec3 as IrVec3};
use polyscad_kernel_math::{cos_deg, sin_deg, Affine, Point2, Point3, Vec3, EPS};
use polyscad_kernel_poly::{Face, PointId, PointRef, Vertex3};

use crate::error::{CsgError, Result};
use crate::lower::{Lowerer, St};
use crate::tower::{build_tower, TowerSpec, TriSide};
use crate::{effective_fn, Csg3, CsgNode, Leaf3, Poly3, Sphere3};

pub(crate) fn sphere(
    lo: &mut Lowerer,
    loc: Loc,
    r: f64,
    fn_: u32,
    st: &St,
) -> Result<Option<Csg3>> {
    if r <= 0.0 {
        lo.empty_geom(loc, "sphere with non-positive radius")?;
        return Ok(None);
    }
    let mat = lo.mats.compose(st.mat, &Affine::scaling(r, r, r));
    if fn_ == 0 {
        // circular target with no faceting: keep it analytic
        return Ok(Some(CsgNode::Leaf(Leaf3::Sphere(Sphere3 {
            mat,
            gc: st.gc,
            loc,
        }))));
    }

    let n = effective_fn(fn_, lo.opt.max_fn) as usize;
    let nz = n.div_ceil(2);
    let mut pts = Vec::with_capacity(n * nz);
    for i in 0..nz {
        // rings at polar angles (2i+1) * 90 / nz, staggered azimuthally
        // on odd rings so the side quads triangulate cleanly
        let polar = (2 * i + 1) as f64 * 90.0 / nz as f64;
        let z = cos_deg(polar);
        let rr = sin_deg(polar);
        let off = if i % 2 == 1 { 0.5 } else { 0.0 };
        for j in 0..n {
            let az = (j as f64 + off) * 360.0 / n as f64;
            pts.push(Vertex3::new(
                Point3::new(rr * cos_deg(az), rr * sin_deg(az), z),
                loc,
            ));
        }
    }
    // rings run from +z downward, so the stacking is reversed
    let spec = TowerSpec {
        ring: n,
        layers: nz,
        apex: false,
        rev: true,
        tri_side: TriSide::Left,
        may_need_tri: false,
    };
    let poly = build_tower(pts, lo.mats.get(mat), &spec, lo.tri, loc)?;
    Ok(Some(CsgNode::Leaf(Leaf3::Poly(Poly3 {
        poly,
        gc: st.gc,
        loc,
    }))))
}

pub(crate) fn cube(
    lo: &mut Lowerer,
    loc: Loc,
    size: IrVec3,
    center: bool,
    st: &St,
) -> Result<Option<Csg3>> {
    if size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
        lo.empty_geom(loc, "cube with non-positive size")?;
        return Ok(None);
    }
    let off = if center {
        Vec3::new(-size.x / 2.0, -size.y / 2.0, -size.z / 2.0)
    } else {
        Vec3::zeros()
    };
    let mut pts = Vec::with_capacity(8);
    for layer in 0..2u32 {
        // i -> ((i&1)^(i&2), i&2) keeps both layers in the same quad order
        for i in 0..4u32 {
            let b0 = i & 1;
            let b1 = (i >> 1) & 1;
            let x = (b0 ^ b1) as f64 * size.x + off.x;
            let y = b1 as f64 * size.y + off.y;
            let z = layer as f64 * size.z + off.z;
            pts.push(Vertex3::new(Point3::new(x, y, z), loc));
        }
    }
    let spec = TowerSpec {
        ring: 4,
        layers: 2,
        apex: false,
        rev: false,
        tri_side: TriSide::None,
        may_need_tri: false,
    };
    let poly = build_tower(pts, lo.mats.get(st.mat), &spec, lo.tri, loc)?;
    Ok(Some(CsgNode::Leaf(Leaf3::Poly(Poly3 {
        poly,
        gc: st.gc,
        loc,
    }))))
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cylinder(
    lo: &mut Lowerer,
    loc: Loc,
    h: f64,
    r1: f64,
    r2: f64,
    center: bool,
    fn_: u32,
    st: &St,
) -> Result<Option<Csg3>> {
    if h <= 0.0 {
        lo.empty_geom(loc, "cylinder with non-positive height")?;
        return Ok(None);
    }
    if r1 < 0.0 || r2 < 0.0 || (r1 <= 0.0 && r2 <= 0.0) {
        lo.empty_geom(loc, "cylinder with empty radius")?;
        return Ok(None);
    }

    // Normalize into the transform: axis spans z in [0,1], the larger
    // radius sits at the bottom (flipping z if needed, which also flips
    // the winding via the determinant), and XY is scaled by it.
    let (rb, rs, flip) = if r1 >= r2 {
        (r1, r2, false)
    } else {
        (r2, r1, true)
    };
    let z0 = if center { -h / 2.0 } else { 0.0 };
    let mut norm = Affine::translation(Vec3::new(0.0, 0.0, z0)).then(&Affine::scaling(
        1.0,
        1.0,
        h,
    ));
    if flip {
        let f = Affine::translation(Vec3::new(0.0, 0.0, 1.0)).then(&Affine::scaling(
            1.0, 1.0, -1.0,
        ));
        norm = norm.then(&f);
    }
    norm = norm.then(&Affine::scaling(rb, rb, 1.0));
    let mat = lo.mats.compose(st.mat, &norm);

    let n = effective_fn(fn_, lo.opt.max_fn) as usize;
    let apex = rs <= 0.0;
    let mut pts = Vec::with_capacity(if apex { n + 1 } else { 2 * n });
    for j in 0..n {
        let az = j as f64 * 360.0 / n as f64;
        pts.push(Vertex3::new(Point3::new(cos_deg(az), sin_deg(az), 0.0), loc));
    }
    if apex {
        pts.push(Vertex3::new(Point3::new(0.0, 0.0, 1.0), loc));
    } else {
        let t = rs / rb;
        for j in 0..n {
            let az = j as f64 * 360.0 / n as f64;
            pts.push(Vertex3::new(
                Point3::new(t * cos_deg(az), t * sin_deg(az), 1.0),
                loc,
            ));
        }
    }
    let spec = TowerSpec {
        ring: n,
        layers: if apex { 1 } else { 2 },
        apex,
        rev: false,
        tri_side: TriSide::None,
        may_need_tri: false,
    };
    let poly = build_tower(pts, lo.mats.get(mat), &spec, lo.tri, loc)?;
    Ok(Some(CsgNode::Leaf(Leaf3::Poly(Poly3 {
        poly,
        gc: st.gc,
        loc,
    }))))
}

pub(crate) fn polyhedron(
    lo: &mut Lowerer,
    loc: Loc,
    points: &[IrVec3],
    point_locs: &[Loc],
    faces: &[Vec<u32>],
    st: &St,
) -> Result<Option<Csg3>> {
    if points.len() < 4 || faces.len() < 4 {
        return lo
            .report(
                Severity::Fatal,
                Diagnostic::new(Severity::Fatal, loc, "degenerate polyhedron"),
                CsgError::DegeneratePolyhedron { loc },
            )
            .map(|_| None);
    }
    let loc_of = |i: usize| point_locs.get(i).copied().unwrap_or(loc);

    // Duplicate points: sort by coordinates, scan neighbors.
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        let (pa, pb) = (points[a], points[b]);
        pa.x.total_cmp(&pb.x)
            .then(pa.y.total_cmp(&pb.y))
            .then(pa.z.total_cmp(&pb.z))
    });
    for w in order.windows(2) {
        let (a, b) = (points[w[0]], points[w[1]]);
        let d2 = (a.x - b.x).powi(2) + (a.y - b.y).powi(2) + (a.z - b.z).powi(2);
        if d2 < EPS * EPS {
            return lo
                .report(
                    Severity::Fatal,
                    Diagnostic::new(Severity::Fatal, loc_of(w[0]), "duplicate point")
                        .with_loc2(loc_of(w[1])),
                    CsgError::DuplicatePoint {
                        loc: loc_of(w[0]),
                        loc2: loc_of(w[1]),
                    },
                )
                .map(|_| None);
        }
    }

    let coords: Vec<Point3> = points.iter().map(|p| Point3::new(p.x, p.y, p.z)).collect();
    let mat = lo.mats.get(st.mat);

    let mut face_list: Vec<Face> = Vec::new();
    for face in faces {
        for &i in face {
            if i as usize >= points.len() {
                let _ = lo.sink.report(Diagnostic::new(
                    Severity::Fatal,
                    loc,
                    "face index out of range",
                ));
                return Err(CsgError::BadIndex { loc });
            }
        }
        // source faces are clockwise seen from outside; internally faces
        // are counter-clockwise seen from outside
        let ring: Vec<usize> = face.iter().rev().map(|&i| i as usize).collect();
        if ring.len() >= 4 && face_needs_triangulation(&ring, &coords) {
            let proj = project_ring(&ring, &coords);
            for t in lo.tri.triangulate(&proj)? {
                let mut f = Vec::with_capacity(3);
                for &k in &t {
                    let pi = ring[k];
                    f.push(PointRef::new(PointId(pi as u32), loc_of(pi)));
                }
                face_list.push(Face::new(f, loc));
            }
        } else {
            let refs = ring
                .iter()
                .map(|&pi| PointRef::new(PointId(pi as u32), loc_of(pi)))
                .collect();
            face_list.push(Face::new(refs, loc));
        }
    }

    if mat.is_mirror() {
        for f in &mut face_list {
            f.points.reverse();
        }
    }

    let verts: Vec<Vertex3> = coords
        .iter()
        .enumerate()
        .map(|(i, c)| Vertex3::new(mat.apply_point(c), loc_of(i)))
        .collect();
    let poly = polyscad_kernel_poly::build_polyhedron(verts, face_list, mat.is_rect_rot())?;
    Ok(Some(CsgNode::Leaf(Leaf3::Poly(Poly3 {
        poly,
        gc: st.gc,
        loc,
    }))))
}

/// Convexity by planar projection: if turns have mixed signs in either
/// the XY or the YZ projection, the face needs triangulation.
fn face_needs_triangulation(ring: &[usize], coords: &[Point3]) -> bool {
    let n = ring.len();
    let picks: [fn(&Point3) -> (f64, f64); 2] = [|p| (p.x, p.y), |p| (p.y, p.z)];
    for pick in picks {
        let mut pos = false;
        let mut neg = false;
        for i in 0..n {
            let (ax, ay) = pick(&coords[ring[i]]);
            let (bx, by) = pick(&coords[ring[(i + 1) % n]]);
            let (cx, cy) = pick(&coords[ring[(i + 2) % n]]);
            let cross = (bx - ax) * (cy - by) - (by - ay) * (cx - bx);
            if cross > EPS {
                pos = true;
            } else if cross < -EPS {
                neg = true;
            }
        }
        if pos && neg {
            return true;
        }
    }
    false
}

/// Project a face ring onto the plane orthogonal to the dominant axis
/// of its Newell normal, preserving the ring's traversal order.
fn project_ring(ring: &[usize], coords: &[Point3]) -> Vec<Point2> {
    let n = ring.len();
    let mut nx = 0.0;
    let mut ny = 0.0;
    let mut nz = 0.0;
    for i in 0..n {
        let a = coords[ring[i]];
        let b = coords[ring[(i + 1) % n]];
        nx += (a.y - b.y) * (a.z + b.z);
        ny += (a.z - b.z) * (a.x + b.x);
        nz += (a.x - b.x) * (a.y + b.y);
    }
    ring.iter()
        .map(|&i| {
            let p = coords[i];
            if nz.abs() >= nx.abs() && nz.abs() >= ny.abs() {
                Point2::new(p.x, p.y)
            } else if nx.abs() >= ny.abs() {
                Point2::new(p.y, p.z)
            } else {
                Point2::new(p.z, p.x)
            }
        })
        .collect()
}
