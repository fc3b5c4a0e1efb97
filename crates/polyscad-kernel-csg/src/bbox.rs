//! Bounding boxes over the 3D CSG tree.
//!
//! A recursive fold. `include_sub` controls whether subtracted and
//! intersected-away volume still counts (useful for output bounds that
//! must stay conservative).

use polyscad_kernel_math::{Aabb3, Affine, MatrixStore, Point3};

use crate::{Csg3, CsgNode, Leaf3};

/// Bounding box of a 3D CSG tree.
pub fn csg3_bbox(node: &Csg3, mats: &MatrixStore, include_sub: bool) -> Aabb3 {
    match node {
        CsgNode::Add(a) => union_of(a.items.iter(), mats, include_sub),
        CsgNode::Sub(s) => {
            let pos = union_of(s.add.items.iter(), mats, include_sub);
            if include_sub {
                pos.union(&union_of(s.sub.items.iter(), mats, include_sub))
            } else {
                pos
            }
        }
        CsgNode::Cut(c) => {
            if include_sub {
                // conservative: keep everything that any operand covers
                let mut bb = Aabb3::empty();
                for operand in &c.cut {
                    bb = bb.union(&union_of(operand.items.iter(), mats, include_sub));
                }
                bb
            } else {
                let mut bb: Option<Aabb3> = None;
                for operand in &c.cut {
                    let ob = union_of(operand.items.iter(), mats, include_sub);
                    bb = Some(match bb {
                        None => ob,
                        Some(prev) => {
                            let i = prev.intersect(&ob);
                            if i.is_empty() {
                                return Aabb3::empty();
                            }
                            i
                        }
                    });
                }
                bb.unwrap_or_else(Aabb3::empty)
            }
        }
        CsgNode::Xor(x) => {
            let mut bb = Aabb3::empty();
            for operand in &x.xor {
                bb = bb.union(&union_of(operand.items.iter(), mats, include_sub));
            }
            bb
        }
        CsgNode::Leaf(Leaf3::Sphere(s)) => sphere_bbox(mats.get(s.mat)),
        CsgNode::Leaf(Leaf3::Poly(p)) => {
            let mut bb = Aabb3::empty();
            for v in &p.poly.points {
                bb.add_point(&v.coord);
            }
            bb
        }
    }
}

fn union_of<'a>(
    items: impl Iterator<Item = &'a Csg3>,
    mats: &MatrixStore,
    include_sub: bool,
) -> Aabb3 {
    let mut bb = Aabb3::empty();
    for item in items {
        bb = bb.union(&csg3_bbox(item, mats, include_sub));
    }
    bb
}

/// Closed-form bound of a transformed unit sphere: per axis `i`, the
/// extent is `w[i] ± sqrt(sum_j b[i][j]^2)`.
fn sphere_bbox(m: &Affine) -> Aabb3 {
    let mut min = [0.0; 3];
    let mut max = [0.0; 3];
    for i in 0..3 {
        let r = (m.b[(i, 0)].powi(2) + m.b[(i, 1)].powi(2) + m.b[(i, 2)].powi(2)).sqrt();
        min[i] = m.w[i] - r;
        max[i] = m.w[i] + r;
    }
    Aabb3 {
        min: Point3::new(min[0], min[1], min[2]),
        max: Point3::new(max[0], max[1], max[2]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Gc, Sphere3};
    use polyscad_ir::Loc;
    use polyscad_kernel_math::{MatId, Vec3};

    fn sphere_leaf(mats: &mut MatrixStore, m: Affine) -> Csg3 {
        let mat = mats.compose(MatId::IDENTITY, &m);
        CsgNode::Leaf(Leaf3::Sphere(Sphere3 {
            mat,
            gc: Gc::default(),
            loc: Loc::NONE,
        }))
    }

    #[test]
    fn test_unit_sphere_bbox() {
        let mut mats = MatrixStore::new();
        let node = sphere_leaf(&mut mats, Affine::identity());
        let bb = csg3_bbox(&node, &mats, true);
        assert!((bb.min - Point3::new(-1.0, -1.0, -1.0)).norm() < 1e-12);
        assert!((bb.max - Point3::new(1.0, 1.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_transformed_sphere_bbox_closed_form() {
        let mut mats = MatrixStore::new();
        let m = Affine::translation(Vec3::new(1.0, 2.0, 3.0))
            .then(&Affine::rotation_z(30.0))
            .then(&Affine::scaling(2.0, 1.0, 0.5));
        let node = sphere_leaf(&mut mats, m);
        let bb = csg3_bbox(&node, &mats, true);
        // Rotating a scaled sphere: per-axis radius is the row norm
        let rx = (m.b[(0, 0)].powi(2) + m.b[(0, 1)].powi(2) + m.b[(0, 2)].powi(2)).sqrt();
        assert!((bb.max.x - (1.0 + rx)).abs() < 1e-12);
        assert!((bb.min.x - (1.0 - rx)).abs() < 1e-12);
        // the bound contains sampled surface points
        for k in 0..32 {
            let a = k as f64 * std::f64::consts::TAU / 32.0;
            let p = m.apply_point(&Point3::new(a.cos(), a.sin(), 0.0));
            assert!(bb.contains(&p));
        }
    }

    #[test]
    fn test_cut_bbox_modes() {
        use crate::{AddNode, CutNode};
        let mut mats = MatrixStore::new();
        let a = sphere_leaf(&mut mats, Affine::identity());
        let b = sphere_leaf(&mut mats, Affine::translation(Vec3::new(1.5, 0.0, 0.0)));
        let node: Csg3 = CsgNode::Cut(CutNode {
            cut: vec![AddNode { items: vec![a] }, AddNode { items: vec![b] }],
        });
        let tight = csg3_bbox(&node, &mats, false);
        assert!((tight.min.x - 0.5).abs() < 1e-12);
        assert!((tight.max.x - 1.0).abs() < 1e-12);
        let wide = csg3_bbox(&node, &mats, true);
        assert!((wide.min.x + 1.0).abs() < 1e-12);
        assert!((wide.max.x - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_cut_is_empty() {
        use crate::{AddNode, CutNode};
        let mut mats = MatrixStore::new();
        let a = sphere_leaf(&mut mats, Affine::identity());
        let b = sphere_leaf(&mut mats, Affine::translation(Vec3::new(10.0, 0.0, 0.0)));
        let node: Csg3 = CsgNode::Cut(CutNode {
            cut: vec![AddNode { items: vec![a] }, AddNode { items: vec![b] }],
        });
        assert!(csg3_bbox(&node, &mats, false).is_empty());
    }
}
