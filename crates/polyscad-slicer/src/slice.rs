//! Slicing 3D CSG leaves with a horizontal plane.
//!
//! The 3D tree is mapped structure-preserving into a per-layer 2D tree:
//! polyhedron leaves intersect their faces with the plane and chain the
//! resulting segments into closed contours; analytic spheres produce
//! the ellipse cross-section of the transformed unit sphere. Contour
//! winding is irrelevant here — the boolean engine that reduces the 2D
//! tree re-derives it from coverage parity.

use polyscad_ir::Loc;
use polyscad_kernel_csg::{
    AddNode, Csg2, Csg3, CsgNode, CutNode, Gc, Leaf2, Leaf3, SubNode, XorNode,
};
use polyscad_kernel_math::{Affine, MatrixStore, Point2, Point3, Vec3};
use polyscad_kernel_poly::{Path2, Polygon2, Polyhedron};

const ON_PLANE_EPS: f64 = 1e-9;
const CHAIN_EPS: f64 = 1e-6;

/// Slice a 3D CSG tree at height `z` into a 2D CSG tree.
///
/// Returns `None` when nothing under the node crosses the plane.
pub fn slice_csg3(node: &Csg3, mats: &MatrixStore, max_fn: u32, z: f64) -> Option<Csg2> {
    match node {
        CsgNode::Add(a) => Some(CsgNode::Add(slice_add(a, mats, max_fn, z))),
        CsgNode::Sub(s) => Some(CsgNode::Sub(Box::new(SubNode {
            add: slice_add(&s.add, mats, max_fn, z),
            sub: slice_add(&s.sub, mats, max_fn, z),
        }))),
        CsgNode::Cut(c) => Some(CsgNode::Cut(CutNode {
            cut: c.cut.iter().map(|a| slice_add(a, mats, max_fn, z)).collect(),
        })),
        CsgNode::Xor(x) => Some(CsgNode::Xor(XorNode {
            xor: x.xor.iter().map(|a| slice_add(a, mats, max_fn, z)).collect(),
        })),
        CsgNode::Leaf(Leaf3::Poly(p)) => {
            slice_polyhedron(&p.poly, z, p.gc, p.loc).map(|polygon| {
                CsgNode::Leaf(Leaf2 {
                    polygon,
                    gc: p.gc,
                    loc: p.loc,
                })
            })
        }
        CsgNode::Leaf(Leaf3::Sphere(s)) => {
            slice_sphere(mats.get(s.mat), max_fn, z, s.gc, s.loc).map(|polygon| {
                CsgNode::Leaf(Leaf2 {
                    polygon,
                    gc: s.gc,
                    loc: s.loc,
                })
            })
        }
    }
}

fn slice_add(add: &AddNode<Leaf3>, mats: &MatrixStore, max_fn: u32, z: f64) -> AddNode<Leaf2> {
    AddNode {
        items: add
            .items
            .iter()
            .filter_map(|i| slice_csg3(i, mats, max_fn, z))
            .collect(),
    }
}

/// Intersect a polyhedron with the plane `z = const`.
fn slice_polyhedron(poly: &Polyhedron, z: f64, gc: Gc, loc: Loc) -> Option<Polygon2> {
    let mut segments: Vec<(Point2, Point2)> = Vec::new();

    for face in &poly.faces {
        let n = face.points.len();
        let mut hits: Vec<Point2> = Vec::with_capacity(2);
        for i in 0..n {
            let a = poly.coord(face.points[i].point);
            let b = poly.coord(face.points[(i + 1) % n].point);
            let da = a.z - z;
            let db = b.z - z;
            if (da > ON_PLANE_EPS && db < -ON_PLANE_EPS)
                || (da < -ON_PLANE_EPS && db > ON_PLANE_EPS)
            {
                let t = da / (da - db);
                hits.push(Point2::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)));
            } else if da.abs() <= ON_PLANE_EPS && db.abs() > ON_PLANE_EPS {
                hits.push(Point2::new(a.x, a.y));
            } else if db.abs() <= ON_PLANE_EPS && da.abs() > ON_PLANE_EPS {
                hits.push(Point2::new(b.x, b.y));
            }
        }
        hits.dedup_by(|p, q| (*p - *q).norm_squared() < CHAIN_EPS * CHAIN_EPS);
        if hits.len() >= 2 && (hits[0] - hits[1]).norm_squared() >= CHAIN_EPS * CHAIN_EPS {
            segments.push((hits[0], hits[1]));
        }
    }

    let contours = chain_segments(segments);
    if contours.is_empty() {
        return None;
    }
    let mut out = Polygon2::new();
    for contour in contours {
        let idx: Vec<u32> = contour
            .into_iter()
            .map(|p| out.push_point(p, gc.color, loc))
            .collect();
        out.paths.push(Path2::new(idx));
    }
    Some(out)
}

/// Chain loose segments into closed contours (greedy endpoint matching).
fn chain_segments(segments: Vec<(Point2, Point2)>) -> Vec<Vec<Point2>> {
    let mut remaining = segments;
    let mut contours: Vec<Vec<Point2>> = Vec::new();

    while let Some((start, end)) = remaining.pop() {
        let mut chain = vec![start, end];
        let mut changed = true;
        while changed {
            changed = false;
            let chain_start = *chain.first().expect("chain non-empty");
            let chain_end = *chain.last().expect("chain non-empty");
            let mut i = 0;
            while i < remaining.len() {
                let (sa, sb) = remaining[i];
                if (sa - chain_end).norm() < CHAIN_EPS {
                    chain.push(sb);
                    remaining.swap_remove(i);
                    changed = true;
                } else if (sb - chain_end).norm() < CHAIN_EPS {
                    chain.push(sa);
                    remaining.swap_remove(i);
                    changed = true;
                } else if (sb - chain_start).norm() < CHAIN_EPS {
                    chain.insert(0, sa);
                    remaining.swap_remove(i);
                    changed = true;
                } else if (sa - chain_start).norm() < CHAIN_EPS {
                    chain.insert(0, sb);
                    remaining.swap_remove(i);
                    changed = true;
                } else {
                    i += 1;
                }
            }
        }
        // closed?
        if chain.len() >= 4 {
            let closes = (*chain.first().expect("non-empty") - *chain.last().expect("non-empty"))
                .norm()
                < CHAIN_EPS;
            if closes {
                chain.pop();
                contours.push(chain);
            }
        }
    }
    contours
}

/// Ellipse cross-section of a transformed unit sphere at `z = const`.
fn slice_sphere(m: &Affine, max_fn: u32, z: f64, gc: Gc, loc: Loc) -> Option<Polygon2> {
    // Points of the solid are m * u with |u| <= 1; the slice plane pulls
    // back to the plane a3 . u = c in unit-sphere space.
    let a3 = Vec3::new(m.b[(2, 0)], m.b[(2, 1)], m.b[(2, 2)]);
    let l2 = a3.norm_squared();
    if l2 < 1e-18 {
        return None;
    }
    let c = z - m.w.z;
    if c * c >= l2 {
        return None;
    }
    let u0 = a3 * (c / l2);
    let rho = (1.0 - c * c / l2).sqrt();

    // orthonormal basis of the pulled-back plane
    let axis = if a3.x.abs() <= a3.y.abs() && a3.x.abs() <= a3.z.abs() {
        Vec3::x()
    } else if a3.y.abs() <= a3.z.abs() {
        Vec3::y()
    } else {
        Vec3::z()
    };
    let e1 = a3.cross(&axis).normalize();
    let e2 = a3.cross(&e1).normalize();

    let n = max_fn.max(3);
    let mut out = Polygon2::new();
    let idx: Vec<u32> = (0..n)
        .map(|j| {
            let ang = j as f64 / n as f64 * std::f64::consts::TAU;
            let u = u0 + (e1 * ang.cos() + e2 * ang.sin()) * rho;
            let p = m.apply_point(&Point3::from(u));
            out.push_point(Point2::new(p.x, p.y), gc.color, loc)
        })
        .collect();
    out.paths.push(Path2::new(idx));
    Some(out)
}
