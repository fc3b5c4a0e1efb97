//! 2D primitives: circle, square, explicit polygon.
//!
//! Points are transformed by the current matrix (XY part) and every
//! path is canonicalized to counter-clockwise winding.

use polyscad_ir::{Diagnostic, Loc, Severity, Vec2 as IrVec2};
use polyscad_kernel_math::{cos_deg, sin_deg, Affine, Point2, Point3, EPS};
use polyscad_kernel_poly::{Path2, Polygon2};

use crate::error::{CsgError, Result};
use crate::lower::{Lowerer, St};
use crate::{effective_fn, Csg2, CsgNode, Gc, Leaf2};

fn to_plane(mat: &Affine, x: f64, y: f64) -> Point2 {
    let p = mat.apply_point(&Point3::new(x, y, 0.0));
    Point2::new(p.x, p.y)
}

fn leaf(mut polygon: Polygon2, gc: Gc, loc: Loc) -> Option<Csg2> {
    polygon.canonicalize();
    if polygon.is_empty() {
        None
    } else {
        Some(CsgNode::Leaf(Leaf2 { polygon, gc, loc }))
    }
}

pub(crate) fn circle(
    lo: &mut Lowerer,
    loc: Loc,
    r: f64,
    fn_: u32,
    st: &St,
) -> Result<Option<Csg2>> {
    if r <= 0.0 {
        lo.empty_geom(loc, "circle with non-positive radius")?;
        return Ok(None);
    }
    let n = effective_fn(fn_, lo.opt.max_fn);
    let mat = *lo.mats.get(st.mat);
    let mut poly = Polygon2::new();
    let idx: Vec<u32> = (0..n)
        .map(|j| {
            let az = j as f64 * 360.0 / n as f64;
            let c = to_plane(&mat, r * cos_deg(az), r * sin_deg(az));
            poly.push_point(c, st.gc.color, loc)
        })
        .collect();
    poly.paths.push(Path2::new(idx));
    Ok(leaf(poly, st.gc, loc))
}

pub(crate) fn square(
    lo: &mut Lowerer,
    loc: Loc,
    size: IrVec2,
    center: bool,
    st: &St,
) -> Result<Option<Csg2>> {
    if size.x <= 0.0 || size.y <= 0.0 {
        lo.empty_geom(loc, "square with non-positive size")?;
        return Ok(None);
    }
    let (ox, oy) = if center {
        (-size.x / 2.0, -size.y / 2.0)
    } else {
        (0.0, 0.0)
    };
    let mat = *lo.mats.get(st.mat);
    let corners = [
        (ox, oy),
        (ox + size.x, oy),
        (ox + size.x, oy + size.y),
        (ox, oy + size.y),
    ];
    let mut poly = Polygon2::new();
    let idx: Vec<u32> = corners
        .iter()
        .map(|&(x, y)| poly.push_point(to_plane(&mat, x, y), st.gc.color, loc))
        .collect();
    poly.paths.push(Path2::new(idx));
    Ok(leaf(poly, st.gc, loc))
}

pub(crate) fn polygon(
    lo: &mut Lowerer,
    loc: Loc,
    points: &[IrVec2],
    point_locs: &[Loc],
    paths: &[Vec<u32>],
    st: &St,
) -> Result<Option<Csg2>> {
    if points.len() < 3 {
        lo.empty_geom(loc, "polygon with fewer than 3 points")?;
        return Ok(None);
    }
    let loc_of = |i: usize| point_locs.get(i).copied().unwrap_or(loc);

    // De-duplicate: map every point to the first one within tolerance.
    let mut canon: Vec<u32> = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        let mut target = i;
        for (j, q) in points[..i].iter().enumerate() {
            if (p.x - q.x).abs() < EPS && (p.y - q.y).abs() < EPS {
                target = j;
                break;
            }
        }
        canon.push(target as u32);
    }

    let mat = *lo.mats.get(st.mat);
    let mut poly = Polygon2::new();
    for (i, p) in points.iter().enumerate() {
        poly.push_point(to_plane(&mat, p.x, p.y), st.gc.color, loc_of(i));
    }

    let implicit: Vec<Vec<u32>>;
    let path_list: &[Vec<u32>] = if paths.is_empty() {
        implicit = vec![(0..points.len() as u32).collect()];
        &implicit
    } else {
        paths
    };

    for path in path_list {
        let mut indices: Vec<u32> = Vec::with_capacity(path.len());
        for &i in path {
            if i as usize >= points.len() {
                let _ = lo.sink.report(Diagnostic::new(
                    Severity::Fatal,
                    loc,
                    "path index out of range",
                ));
                return Err(CsgError::BadIndex { loc });
            }
            let c = canon[i as usize];
            if indices.last() != Some(&c) {
                indices.push(c);
            }
        }
        while indices.len() > 1 && indices.first() == indices.last() {
            indices.pop();
        }
        if indices.len() >= 3 {
            poly.paths.push(Path2::new(indices));
        }
    }

    if poly.paths.is_empty() {
        lo.empty_geom(loc, "polygon with no usable path")?;
        return Ok(None);
    }
    Ok(leaf(poly, st.gc, loc))
}
