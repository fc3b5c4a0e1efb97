//! Linear extrusion of a 2D subtree into tower polyhedra.
//!
//! The child subtree is lowered in 2D context with an identity
//! transform, flattened to one polygon by the boolean engine, and each
//! path is extruded as its own tower: `slices + 1` rings (or `slices`
//! rings plus an apex when both scale components are zero), each ring
//! the path's points rotated by `-twist * t` and scaled by
//! `lerp(1, scale, t)` at `t = k / slices`. With several paths the
//! towers are combined by XOR so interior holes come out by parity.

use polyscad_ir::{Diagnostic, ScadKind, ScadNode, Severity};
use polyscad_kernel_math::{cos_deg, sin_deg, MatId, Point3};
use polyscad_kernel_poly::Vertex3;

use crate::csg2;
use crate::error::{CsgError, Result};
use crate::lower::{Lowerer, St};
use crate::tower::{build_tower, TowerSpec, TriSide};
use crate::{AddNode, Csg2, Csg3, CsgNode, Leaf3, Poly3, XorNode};

pub(crate) fn lower_extrude(
    lo: &mut Lowerer,
    node: &ScadNode,
    st: St,
    out: &mut Vec<Csg3>,
) -> Result<()> {
    let ScadKind::LinearExtrude {
        height,
        slices,
        twist,
        scale,
        center,
        children,
    } = &node.kind
    else {
        return Err(CsgError::Internal("lower_extrude on wrong node".into()));
    };
    let loc = node.loc;

    if *height <= 0.0 {
        return lo.empty_geom(loc, "extrusion with non-positive height");
    }
    if *slices < 1 {
        return lo.empty_geom(loc, "extrusion with no slices");
    }
    let mut sx = scale.x;
    let mut sy = scale.y;
    if sx < 0.0 {
        lo.empty_geom(loc, "negative extrusion x scale clamped to zero")?;
        sx = 0.0;
    }
    if sy < 0.0 {
        lo.empty_geom(loc, "negative extrusion y scale clamped to zero")?;
        sy = 0.0;
    }
    if (sx == 0.0) != (sy == 0.0) {
        // the degenerate side faces would need a topology change
        let msg = "linear_extrude with exactly one zero scale axis";
        let _ = lo
            .sink
            .report(Diagnostic::new(Severity::Fatal, loc, msg));
        return Err(CsgError::Unsupported {
            loc,
            msg: msg.into(),
        });
    }

    // The 2D subtree is lowered with an identity transform; the 3D
    // transform applies to the finished towers.
    let st2 = St {
        mat: MatId::IDENTITY,
        gc: st.gc,
    };
    let mut items2: Vec<Csg2> = Vec::new();
    lo.lower_nodes2(children, st2, &mut items2)?;
    let Some(flat) = csg2::reduce_add(&items2)? else {
        return Ok(());
    };

    let both_zero = sx == 0.0 && sy == 0.0;
    let nslices = *slices as usize;
    let layers = if both_zero { nslices } else { nslices + 1 };
    let z0 = if *center { -height / 2.0 } else { 0.0 };
    let tri_side = if *twist == 0.0 && sx == 1.0 && sy == 1.0 {
        TriSide::None
    } else if *twist < 0.0 {
        TriSide::Right
    } else {
        TriSide::Left
    };

    let mut towers: Vec<Csg3> = Vec::new();
    for path in &flat.paths {
        let n = path.indices.len();
        if n < 3 {
            continue;
        }
        let rev = flat.path_area(path) < 0.0;
        let mut pts: Vec<Vertex3> = Vec::with_capacity(n * layers + usize::from(both_zero));
        for k in 0..layers {
            let t = k as f64 / nslices as f64;
            let (kx, ky) = (1.0 + (sx - 1.0) * t, 1.0 + (sy - 1.0) * t);
            let ang = -twist * t;
            let (sn, cs) = (sin_deg(ang), cos_deg(ang));
            let z = z0 + t * height;
            for &i in &path.indices {
                let v = flat.points[i as usize];
                let rx = v.coord.x * cs - v.coord.y * sn;
                let ry = v.coord.x * sn + v.coord.y * cs;
                pts.push(Vertex3::new(Point3::new(kx * rx, ky * ry, z), v.loc));
            }
        }
        if both_zero {
            pts.push(Vertex3::new(Point3::new(0.0, 0.0, z0 + height), loc));
        }
        let spec = TowerSpec {
            ring: n,
            layers,
            apex: both_zero,
            rev,
            tri_side,
            may_need_tri: true,
        };
        let poly = build_tower(pts, lo.mats.get(st.mat), &spec, lo.tri, loc)?;
        towers.push(CsgNode::Leaf(Leaf3::Poly(Poly3 {
            poly,
            gc: st.gc,
            loc,
        })));
    }

    match towers.len() {
        0 => {}
        1 => out.push(towers.pop().expect("len checked")),
        _ => out.push(CsgNode::Xor(XorNode {
            xor: towers
                .into_iter()
                .map(|t| AddNode { items: vec![t] })
                .collect(),
        })),
    }
    Ok(())
}
