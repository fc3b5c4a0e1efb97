//! The SCAD → CSG lowering walk.
//!
//! Threads a read-only current transform (a matrix-arena handle) and a
//! graphics context down the recursion. Union appends children to the
//! surrounding add list; difference and intersection build SUB and CUT
//! nodes out of per-child add lists; transform operators post-multiply
//! into the current matrix. Empty children are dropped everywhere.

use polyscad_ir::{
    Diagnostic, DiagSink, Loc, Modifiers, Options, Rotation, ScadKind, ScadNode, Severity,
    SinkFlow,
};
use polyscad_kernel_math::{Affine, MatId, MatrixStore, Vec3};
use polyscad_kernel_poly::FaceTriangulator;

use crate::error::{CsgError, Result};
use crate::{extrude, prim2, prim3};
use crate::{AddNode, Csg2, Csg3, CsgNode, CutNode, Gc, SubNode};

/// Lowering state passed by value down the recursion.
#[derive(Debug, Clone, Copy)]
pub(crate) struct St {
    /// Current transform (arena handle).
    pub mat: MatId,
    /// Current graphics context.
    pub gc: Gc,
}

/// Shared lowering context.
pub(crate) struct Lowerer<'a> {
    pub(crate) opt: &'a Options,
    pub(crate) mats: &'a mut MatrixStore,
    pub(crate) sink: &'a mut dyn DiagSink,
    pub(crate) tri: &'a dyn FaceTriangulator,
}

/// Lower a SCAD forest into a 3D CSG tree.
///
/// Returns `None` when the whole input lowers to nothing (all children
/// empty or disabled). Diagnostics go to `sink`; severities come from
/// `opt`. On error the partial tree must be discarded together with the
/// matrix store.
pub fn lower(
    opt: &Options,
    mats: &mut MatrixStore,
    sink: &mut dyn DiagSink,
    tri: &dyn FaceTriangulator,
    roots: &[ScadNode],
) -> Result<Option<Csg3>> {
    let mut lo = Lowerer {
        opt,
        mats,
        sink,
        tri,
    };
    let st = St {
        mat: MatId::IDENTITY,
        gc: Gc::default(),
    };
    let mut items = Vec::new();
    lo.lower_nodes3(roots, st, &mut items)?;
    Ok(if items.is_empty() {
        None
    } else {
        Some(CsgNode::add(items))
    })
}

impl Lowerer<'_> {
    // ------------------------------------------------------------------
    // diagnostics

    /// Report at the given severity. `Ignore` drops silently, `Warn`
    /// reports and continues (unless the sink aborts), `Fatal` reports
    /// and fails with `fatal`.
    pub(crate) fn report(
        &mut self,
        sev: Severity,
        diag: Diagnostic,
        fatal: CsgError,
    ) -> Result<()> {
        match sev {
            Severity::Ignore => Ok(()),
            Severity::Warn => {
                let mut diag = diag;
                diag.severity = Severity::Warn;
                if self.sink.report(diag) == SinkFlow::Abort {
                    Err(CsgError::Aborted)
                } else {
                    Ok(())
                }
            }
            Severity::Fatal => {
                let mut diag = diag;
                diag.severity = Severity::Fatal;
                let _ = self.sink.report(diag);
                Err(fatal)
            }
        }
    }

    /// Empty-geometry class; `Ok(())` means the subtree is dropped.
    pub(crate) fn empty_geom(&mut self, loc: Loc, msg: &str) -> Result<()> {
        let sev = self.opt.err_empty;
        self.report(
            sev,
            Diagnostic::new(sev, loc, msg),
            CsgError::Empty { loc },
        )
    }

    fn collapse(&mut self, loc: Loc, msg: &str) -> Result<()> {
        let sev = self.opt.err_collapse;
        self.report(
            sev,
            Diagnostic::new(sev, loc, msg),
            CsgError::Collapse { loc },
        )
    }

    fn outside_2d(&mut self, loc: Loc) -> Result<()> {
        let sev = self.opt.err_outside_2d;
        self.report(
            sev,
            Diagnostic::new(sev, loc, "2D object outside 2D context"),
            CsgError::Outside2d { loc },
        )
    }

    fn outside_3d(&mut self, loc: Loc) -> Result<()> {
        let sev = self.opt.err_outside_3d;
        self.report(
            sev,
            Diagnostic::new(sev, loc, "3D object inside 2D context"),
            CsgError::Outside3d { loc },
        )
    }

    // ------------------------------------------------------------------
    // transform threading

    /// Child state for a transform or color operator; `None` drops the
    /// subtree (collapsing or empty transform).
    fn child_state(&mut self, node: &ScadNode, st: &St) -> Result<Option<St>> {
        let mut st = *st;
        match &node.kind {
            ScadKind::Translate { v, .. } => {
                if !v.is_zero() {
                    let t = Affine::translation(Vec3::new(v.x, v.y, v.z));
                    st.mat = self.mats.compose(st.mat, &t);
                }
            }
            ScadKind::Scale { v, .. } => {
                if v.x == 0.0 || v.y == 0.0 || v.z == 0.0 {
                    self.empty_geom(node.loc, "scale by zero")?;
                    return Ok(None);
                }
                st.mat = self.mats.compose(st.mat, &Affine::scaling(v.x, v.y, v.z));
            }
            ScadKind::Rotate { rot, .. } => match rot {
                Rotation::Euler { angles } => {
                    let r = Affine::rotation_euler(angles.x, angles.y, angles.z);
                    st.mat = self.mats.compose(st.mat, &r);
                }
                Rotation::Axis { axis, angle } => {
                    if axis.is_zero() {
                        self.empty_geom(node.loc, "rotation around zero axis")?;
                        return Ok(None);
                    }
                    let r = Affine::rotation_axis(Vec3::new(axis.x, axis.y, axis.z), *angle);
                    st.mat = self.mats.compose(st.mat, &r);
                }
            },
            ScadKind::Mirror { v, .. } => {
                if v.is_zero() {
                    // always fatal, whatever the configuration
                    let _ = self.sink.report(Diagnostic::new(
                        Severity::Fatal,
                        node.loc,
                        "mirror by zero vector",
                    ));
                    return Err(CsgError::Empty { loc: node.loc });
                }
                let m = Affine::mirror(Vec3::new(v.x, v.y, v.z));
                st.mat = self.mats.compose(st.mat, &m);
            }
            ScadKind::MultMatrix { rows, .. } => {
                let m = Affine::from_rows(rows);
                if m.is_singular() {
                    self.collapse(node.loc, "multmatrix collapses geometry")?;
                    return Ok(None);
                }
                st.mat = self.mats.compose(st.mat, &m);
            }
            ScadKind::Color { rgba, .. } => {
                st.gc.color = *rgba;
            }
            _ => return Err(CsgError::Internal("child_state on non-transform".into())),
        }
        Ok(Some(st))
    }

    // ------------------------------------------------------------------
    // 3D context

    pub(crate) fn lower_nodes3(
        &mut self,
        nodes: &[ScadNode],
        st: St,
        out: &mut Vec<Csg3>,
    ) -> Result<()> {
        for node in nodes {
            self.lower_node3(node, st, out)?;
        }
        Ok(())
    }

    fn lower_node3(&mut self, node: &ScadNode, mut st: St, out: &mut Vec<Csg3>) -> Result<()> {
        if node.modifiers.contains(Modifiers::DISABLE) {
            return Ok(());
        }
        st.gc.modifiers = st.gc.modifiers.union(node.modifiers);

        match &node.kind {
            ScadKind::Union { children } => self.lower_nodes3(children, st, out),
            ScadKind::Difference { children } => self.lower_difference3(children, st, out),
            ScadKind::Intersection { children } => self.lower_intersection3(children, st, out),
            ScadKind::Translate { children, .. }
            | ScadKind::Scale { children, .. }
            | ScadKind::Rotate { children, .. }
            | ScadKind::Mirror { children, .. }
            | ScadKind::MultMatrix { children, .. }
            | ScadKind::Color { children, .. } => {
                if let Some(child_st) = self.child_state(node, &st)? {
                    self.lower_nodes3(children, child_st, out)?;
                }
                Ok(())
            }
            ScadKind::LinearExtrude { .. } => extrude::lower_extrude(self, node, st, out),
            ScadKind::Sphere { r, fn_ } => {
                if let Some(leaf) = prim3::sphere(self, node.loc, *r, *fn_, &st)? {
                    out.push(leaf);
                }
                Ok(())
            }
            ScadKind::Cube { size, center } => {
                if let Some(leaf) = prim3::cube(self, node.loc, *size, *center, &st)? {
                    out.push(leaf);
                }
                Ok(())
            }
            ScadKind::Cylinder {
                h,
                r1,
                r2,
                center,
                fn_,
            } => {
                if let Some(leaf) =
                    prim3::cylinder(self, node.loc, *h, *r1, *r2, *center, *fn_, &st)?
                {
                    out.push(leaf);
                }
                Ok(())
            }
            ScadKind::Polyhedron {
                points,
                point_locs,
                faces,
            } => {
                if let Some(leaf) =
                    prim3::polyhedron(self, node.loc, points, point_locs, faces, &st)?
                {
                    out.push(leaf);
                }
                Ok(())
            }
            ScadKind::Circle { .. } | ScadKind::Square { .. } | ScadKind::Polygon { .. } => {
                self.outside_2d(node.loc)
            }
        }
    }

    fn lower_difference3(
        &mut self,
        children: &[ScadNode],
        st: St,
        out: &mut Vec<Csg3>,
    ) -> Result<()> {
        let mut pos: Vec<Csg3> = Vec::new();
        let mut i = 0;
        while i < children.len() && pos.is_empty() {
            self.lower_node3(&children[i], st, &mut pos)?;
            i += 1;
        }
        if pos.is_empty() {
            return Ok(());
        }
        let mut neg: Vec<Csg3> = Vec::new();
        for child in &children[i..] {
            self.lower_node3(child, st, &mut neg)?;
        }
        if neg.is_empty() {
            out.append(&mut pos);
            return Ok(());
        }
        // If the positive side itself lowered to a single SUB, fold the
        // new negatives into it: A - (B - C) - D becomes one node.
        if pos.len() == 1 && matches!(pos[0], CsgNode::Sub(_)) {
            let Some(CsgNode::Sub(mut sub)) = pos.pop() else {
                unreachable!()
            };
            sub.sub.items.append(&mut neg);
            out.push(CsgNode::Sub(sub));
            return Ok(());
        }
        out.push(CsgNode::Sub(Box::new(SubNode {
            add: AddNode { items: pos },
            sub: AddNode { items: neg },
        })));
        Ok(())
    }

    fn lower_intersection3(
        &mut self,
        children: &[ScadNode],
        st: St,
        out: &mut Vec<Csg3>,
    ) -> Result<()> {
        let mut operands: Vec<AddNode<crate::Leaf3>> = Vec::new();
        for child in children {
            let mut items = Vec::new();
            self.lower_node3(child, st, &mut items)?;
            if !items.is_empty() {
                operands.push(AddNode { items });
            }
        }
        match operands.len() {
            0 => {}
            1 => out.append(&mut operands.pop().expect("len checked").items),
            _ => out.push(CsgNode::Cut(CutNode { cut: operands })),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // 2D context (inside linear_extrude)

    pub(crate) fn lower_nodes2(
        &mut self,
        nodes: &[ScadNode],
        st: St,
        out: &mut Vec<Csg2>,
    ) -> Result<()> {
        for node in nodes {
            self.lower_node2(node, st, out)?;
        }
        Ok(())
    }

    fn lower_node2(&mut self, node: &ScadNode, mut st: St, out: &mut Vec<Csg2>) -> Result<()> {
        if node.modifiers.contains(Modifiers::DISABLE) {
            return Ok(());
        }
        st.gc.modifiers = st.gc.modifiers.union(node.modifiers);

        match &node.kind {
            ScadKind::Union { children } => self.lower_nodes2(children, st, out),
            ScadKind::Difference { children } => self.lower_difference2(children, st, out),
            ScadKind::Intersection { children } => self.lower_intersection2(children, st, out),
            ScadKind::Translate { children, .. }
            | ScadKind::Scale { children, .. }
            | ScadKind::Rotate { children, .. }
            | ScadKind::Mirror { children, .. }
            | ScadKind::MultMatrix { children, .. }
            | ScadKind::Color { children, .. } => {
                if let Some(child_st) = self.child_state(node, &st)? {
                    self.lower_nodes2(children, child_st, out)?;
                }
                Ok(())
            }
            ScadKind::Circle { r, fn_ } => {
                if let Some(leaf) = prim2::circle(self, node.loc, *r, *fn_, &st)? {
                    out.push(leaf);
                }
                Ok(())
            }
            ScadKind::Square { size, center } => {
                if let Some(leaf) = prim2::square(self, node.loc, *size, *center, &st)? {
                    out.push(leaf);
                }
                Ok(())
            }
            ScadKind::Polygon {
                points,
                point_locs,
                paths,
            } => {
                if let Some(leaf) = prim2::polygon(self, node.loc, points, point_locs, paths, &st)?
                {
                    out.push(leaf);
                }
                Ok(())
            }
            ScadKind::LinearExtrude { .. }
            | ScadKind::Sphere { .. }
            | ScadKind::Cube { .. }
            | ScadKind::Cylinder { .. }
            | ScadKind::Polyhedron { .. } => self.outside_3d(node.loc),
        }
    }

    fn lower_difference2(
        &mut self,
        children: &[ScadNode],
        st: St,
        out: &mut Vec<Csg2>,
    ) -> Result<()> {
        let mut pos: Vec<Csg2> = Vec::new();
        let mut i = 0;
        while i < children.len() && pos.is_empty() {
            self.lower_node2(&children[i], st, &mut pos)?;
            i += 1;
        }
        if pos.is_empty() {
            return Ok(());
        }
        let mut neg: Vec<Csg2> = Vec::new();
        for child in &children[i..] {
            self.lower_node2(child, st, &mut neg)?;
        }
        if neg.is_empty() {
            out.append(&mut pos);
            return Ok(());
        }
        if pos.len() == 1 && matches!(pos[0], CsgNode::Sub(_)) {
            let Some(CsgNode::Sub(mut sub)) = pos.pop() else {
                unreachable!()
            };
            sub.sub.items.append(&mut neg);
            out.push(CsgNode::Sub(sub));
            return Ok(());
        }
        out.push(CsgNode::Sub(Box::new(SubNode {
            add: AddNode { items: pos },
            sub: AddNode { items: neg },
        })));
        Ok(())
    }

    fn lower_intersection2(
        &mut self,
        children: &[ScadNode],
        st: St,
        out: &mut Vec<Csg2>,
    ) -> Result<()> {
        let mut operands: Vec<AddNode<crate::Leaf2>> = Vec::new();
        for child in children {
            let mut items = Vec::new();
            self.lower_node2(child, st, &mut items)?;
            if !items.is_empty() {
                operands.push(AddNode { items });
            }
        }
        match operands.len() {
            0 => {}
            1 => out.append(&mut operands.pop().expect("len checked").items),
            _ => out.push(CsgNode::Cut(CutNode { cut: operands })),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::{csg3_bbox, Leaf3};
    use polyscad_ir::{DiagBuffer, Vec2 as IrVec2, Vec3 as IrVec3};
    use polyscad_kernel_math::Point3;
    use polyscad_kernel_poly::{EarClip, Polyhedron};

    fn lower_roots(roots: &[ScadNode]) -> Result<(Option<Csg3>, MatrixStore, DiagBuffer)> {
        let opt = Options::default();
        let mut mats = MatrixStore::new();
        let mut sink = DiagBuffer::new();
        let root = lower(&opt, &mut mats, &mut sink, &EarClip, roots)?;
        Ok((root, mats, sink))
    }

    fn cube_node(size: f64, center: bool) -> ScadNode {
        ScadNode::new(ScadKind::Cube {
            size: IrVec3::new(size, size, size),
            center,
        })
    }

    fn leaf_polys(node: &Csg3) -> Vec<&Polyhedron> {
        let mut out = Vec::new();
        collect_polys(node, &mut out);
        out
    }

    fn collect_polys<'a>(node: &'a Csg3, out: &mut Vec<&'a Polyhedron>) {
        match node {
            CsgNode::Add(a) => a.items.iter().for_each(|i| collect_polys(i, out)),
            CsgNode::Sub(s) => {
                s.add.items.iter().for_each(|i| collect_polys(i, out));
                s.sub.items.iter().for_each(|i| collect_polys(i, out));
            }
            CsgNode::Cut(c) => c
                .cut
                .iter()
                .flat_map(|a| a.items.iter())
                .for_each(|i| collect_polys(i, out)),
            CsgNode::Xor(x) => x
                .xor
                .iter()
                .flat_map(|a| a.items.iter())
                .for_each(|i| collect_polys(i, out)),
            CsgNode::Leaf(Leaf3::Poly(p)) => out.push(&p.poly),
            CsgNode::Leaf(Leaf3::Sphere(_)) => {}
        }
    }

    fn mesh_volume(poly: &Polyhedron) -> f64 {
        let mut vol = 0.0;
        for face in &poly.faces {
            let a = poly.coord(face.points[0].point);
            for i in 1..face.points.len() - 1 {
                let b = poly.coord(face.points[i].point);
                let c = poly.coord(face.points[i + 1].point);
                vol += a.coords.dot(&b.coords.cross(&c.coords)) / 6.0;
            }
        }
        vol
    }

    #[test]
    fn test_unit_cube_lowering() {
        let (root, mats, _) = lower_roots(&[cube_node(1.0, false)]).unwrap();
        let root = root.unwrap();
        let polys = leaf_polys(&root);
        assert_eq!(polys.len(), 1);
        let cube = polys[0];
        assert_eq!(cube.points.len(), 8);
        assert_eq!(cube.faces.len(), 6);
        assert_eq!(cube.edges.len(), 12);
        cube.check_manifold().unwrap();
        assert_relative_eq!(mesh_volume(cube), 1.0, epsilon = 1e-9);
        assert!(cube.rect_rot);

        let bb = csg3_bbox(&root, &mats, true);
        assert!((bb.min - Point3::new(0.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((bb.max - Point3::new(1.0, 1.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_centered_cube_bbox() {
        let (root, mats, _) = lower_roots(&[cube_node(2.0, true)]).unwrap();
        let bb = csg3_bbox(&root.unwrap(), &mats, true);
        assert!((bb.min - Point3::new(-1.0, -1.0, -1.0)).norm() < 1e-12);
        assert!((bb.max - Point3::new(1.0, 1.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_difference_tree_shape() {
        let diff = ScadNode::new(ScadKind::Difference {
            children: vec![
                cube_node(2.0, true),
                ScadNode::new(ScadKind::Sphere { r: 1.2, fn_: 16 }),
            ],
        });
        let (root, mats, _) = lower_roots(&[diff]).unwrap();
        let root = root.unwrap();
        let CsgNode::Add(add) = &root else {
            panic!("expected Add root");
        };
        assert_eq!(add.items.len(), 1);
        let CsgNode::Sub(sub) = &add.items[0] else {
            panic!("expected Sub node");
        };
        assert_eq!(sub.add.items.len(), 1);
        assert_eq!(sub.sub.items.len(), 1);
        assert!(matches!(sub.sub.items[0], CsgNode::Leaf(Leaf3::Poly(_))));
        for poly in leaf_polys(&root) {
            poly.check_manifold().unwrap();
        }
        // soundness: every leaf point inside the include-subtracted box
        let bb = csg3_bbox(&root, &mats, true);
        for poly in leaf_polys(&root) {
            for v in &poly.points {
                assert!(bb.contains(&v.coord));
            }
        }
    }

    #[test]
    fn test_sub_collapse_rule() {
        // difference(difference(A, B), C) folds C into the inner SUB
        let inner = ScadNode::new(ScadKind::Difference {
            children: vec![cube_node(4.0, true), cube_node(2.0, true)],
        });
        let outer = ScadNode::new(ScadKind::Difference {
            children: vec![inner, cube_node(1.0, true)],
        });
        let (root, _, _) = lower_roots(&[outer]).unwrap();
        let CsgNode::Add(add) = root.unwrap() else {
            panic!("expected Add root");
        };
        let CsgNode::Sub(sub) = &add.items[0] else {
            panic!("expected Sub node");
        };
        assert_eq!(sub.add.items.len(), 1);
        assert_eq!(sub.sub.items.len(), 2);
    }

    #[test]
    fn test_sphere_fn4_bipyramid() {
        let (root, _, _) =
            lower_roots(&[ScadNode::new(ScadKind::Sphere { r: 1.0, fn_: 4 })]).unwrap();
        let root = root.unwrap();
        let polys = leaf_polys(&root);
        assert_eq!(polys.len(), 1);
        let s = polys[0];
        // fn=4, fnz=2: two staggered rings of 4
        assert_eq!(s.points.len(), 8);
        // 2 quad caps + 8 side triangles
        assert_eq!(s.faces.len(), 10);
        s.check_manifold().unwrap();
        assert!(mesh_volume(s) > 0.0);
    }

    #[test]
    fn test_analytic_sphere_when_fn_zero() {
        let (root, mats, _) =
            lower_roots(&[ScadNode::new(ScadKind::Sphere { r: 2.0, fn_: 0 })]).unwrap();
        let CsgNode::Add(add) = root.unwrap() else {
            panic!()
        };
        let CsgNode::Leaf(Leaf3::Sphere(s)) = &add.items[0] else {
            panic!("expected analytic sphere");
        };
        let bb = csg3_bbox(&CsgNode::Leaf(Leaf3::Sphere(*s)), &mats, true);
        assert!((bb.max.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cylinder_flip_normalization() {
        // r2 > r1: flipped so the larger ring is at the bottom; the
        // resulting solid is identical to the unflipped cone
        let up = ScadNode::new(ScadKind::Cylinder {
            h: 2.0,
            r1: 1.0,
            r2: 2.0,
            center: false,
            fn_: 8,
        });
        let (root, mats, _) = lower_roots(&[up]).unwrap();
        let root = root.unwrap();
        let polys = leaf_polys(&root);
        let cone = polys[0];
        cone.check_manifold().unwrap();
        assert!(mesh_volume(cone) > 0.0);
        let bb = csg3_bbox(&root, &mats, true);
        assert!((bb.min.z).abs() < 1e-9);
        assert!((bb.max.z - 2.0).abs() < 1e-9);
        assert!((bb.max.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cone_apex() {
        let cone = ScadNode::new(ScadKind::Cylinder {
            h: 1.0,
            r1: 1.0,
            r2: 0.0,
            center: false,
            fn_: 8,
        });
        let (root, _, _) = lower_roots(&[cone]).unwrap();
        let polys_root = root.unwrap();
        let polys = leaf_polys(&polys_root);
        // 8 ring points + apex
        assert_eq!(polys[0].points.len(), 9);
        polys[0].check_manifold().unwrap();
        assert!((mesh_volume(polys[0])) > 0.0);
    }

    #[test]
    fn test_mirror_parity() {
        let plain = lower_roots(&[cube_node(1.0, false)]).unwrap();
        let mirrored = lower_roots(&[ScadNode::new(ScadKind::Mirror {
            v: IrVec3::new(1.0, 0.0, 0.0),
            children: vec![cube_node(1.0, false)],
        })])
        .unwrap();
        let plain_root = plain.0.unwrap();
        let mirrored_root = mirrored.0.unwrap();
        let p = leaf_polys(&plain_root)[0];
        let m = leaf_polys(&mirrored_root)[0];
        m.check_manifold().unwrap();
        // winding still yields positive volume after mirroring
        assert!((mesh_volume(p) - 1.0).abs() < 1e-9);
        assert!((mesh_volume(m) - 1.0).abs() < 1e-9);
        // and the mirrored solid occupies x in [-1, 0]
        assert!(m.points.iter().all(|v| v.coord.x <= 1e-12));
    }

    fn tetra_node() -> ScadNode {
        // faces wound clockwise seen from outside, as in the source format
        ScadNode::new(ScadKind::Polyhedron {
            points: vec![
                IrVec3::new(0.0, 0.0, 0.0),
                IrVec3::new(1.0, 0.0, 0.0),
                IrVec3::new(0.0, 1.0, 0.0),
                IrVec3::new(0.0, 0.0, 1.0),
            ],
            point_locs: vec![],
            faces: vec![
                vec![0, 1, 2],
                vec![0, 3, 1],
                vec![1, 3, 2],
                vec![2, 3, 0],
            ],
        })
    }

    #[test]
    fn test_polyhedron_primitive() {
        let (root, _, _) = lower_roots(&[tetra_node()]).unwrap();
        let polys_root = root.unwrap();
        let t = leaf_polys(&polys_root)[0];
        assert_eq!(t.points.len(), 4);
        assert_eq!(t.faces.len(), 4);
        assert_eq!(t.edges.len(), 6);
        t.check_manifold().unwrap();
        assert_relative_eq!(mesh_volume(t), 1.0 / 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_polyhedron_duplicate_point_is_fatal() {
        let mut node = tetra_node();
        if let ScadKind::Polyhedron { points, .. } = &mut node.kind {
            points[1] = points[0];
        }
        let err = lower_roots(&[node]).unwrap_err();
        assert!(matches!(err, CsgError::DuplicatePoint { .. }));
    }

    #[test]
    fn test_polyhedron_too_small_is_fatal() {
        let node = ScadNode::new(ScadKind::Polyhedron {
            points: vec![
                IrVec3::new(0.0, 0.0, 0.0),
                IrVec3::new(1.0, 0.0, 0.0),
                IrVec3::new(0.0, 1.0, 0.0),
            ],
            point_locs: vec![],
            faces: vec![vec![0, 1, 2]],
        });
        let err = lower_roots(&[node]).unwrap_err();
        assert!(matches!(err, CsgError::DegeneratePolyhedron { .. }));
    }

    #[test]
    fn test_zero_scale_drops_subtree() {
        let scaled = ScadNode::new(ScadKind::Scale {
            v: IrVec3::new(0.0, 1.0, 1.0),
            children: vec![cube_node(1.0, false)],
        });
        let (root, _, sink) = lower_roots(&[scaled]).unwrap();
        assert!(root.is_none());
        assert_eq!(sink.entries.len(), 1);
    }

    #[test]
    fn test_mirror_zero_vector_is_fatal() {
        let bad = ScadNode::new(ScadKind::Mirror {
            v: IrVec3::new(0.0, 0.0, 0.0),
            children: vec![cube_node(1.0, false)],
        });
        assert!(lower_roots(&[bad]).is_err());
    }

    #[test]
    fn test_single_operand_intersection_collapses() {
        let isect = ScadNode::new(ScadKind::Intersection {
            children: vec![cube_node(1.0, false)],
        });
        let (root, _, _) = lower_roots(&[isect]).unwrap();
        let CsgNode::Add(add) = root.unwrap() else {
            panic!()
        };
        assert!(matches!(add.items[0], CsgNode::Leaf(_)));
    }

    #[test]
    fn test_disable_modifier_skips() {
        let mut node = cube_node(1.0, false);
        node.modifiers = Modifiers::DISABLE;
        let (root, _, sink) = lower_roots(&[node]).unwrap();
        assert!(root.is_none());
        assert!(sink.entries.is_empty());
    }

    #[test]
    fn test_2d_primitive_in_3d_context_is_fatal_by_default() {
        let circle = ScadNode::new(ScadKind::Circle { r: 1.0, fn_: 8 });
        let err = lower_roots(&[circle]).unwrap_err();
        assert!(matches!(err, CsgError::Outside2d { .. }));
    }

    #[test]
    fn test_extrude_square() {
        let ext = ScadNode::new(ScadKind::LinearExtrude {
            height: 2.0,
            slices: 1,
            twist: 0.0,
            scale: IrVec2::new(1.0, 1.0),
            center: false,
            children: vec![ScadNode::new(ScadKind::Square {
                size: IrVec2::new(1.0, 1.0),
                center: false,
            })],
        });
        let (root, _, _) = lower_roots(&[ext]).unwrap();
        let root = root.unwrap();
        let polys = leaf_polys(&root);
        assert_eq!(polys.len(), 1);
        let p = polys[0];
        assert_eq!(p.points.len(), 8);
        assert_eq!(p.faces.len(), 6);
        p.check_manifold().unwrap();
        assert_relative_eq!(mesh_volume(p), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_extrude_with_twist_triangulates_sides() {
        let ext = ScadNode::new(ScadKind::LinearExtrude {
            height: 1.0,
            slices: 4,
            twist: 90.0,
            scale: IrVec2::new(1.0, 1.0),
            center: false,
            children: vec![ScadNode::new(ScadKind::Square {
                size: IrVec2::new(1.0, 1.0),
                center: true,
            })],
        });
        let (root, _, _) = lower_roots(&[ext]).unwrap();
        let polys_root = root.unwrap();
        let p = leaf_polys(&polys_root)[0];
        // 5 rings of 4 points
        assert_eq!(p.points.len(), 20);
        // 2 caps + 4 bands * 4 quads * 2 triangles
        assert_eq!(p.faces.len(), 34);
        p.check_manifold().unwrap();
    }

    #[test]
    fn test_extrude_polygon_with_hole_becomes_xor() {
        let ext = ScadNode::new(ScadKind::LinearExtrude {
            height: 1.0,
            slices: 1,
            twist: 0.0,
            scale: IrVec2::new(1.0, 1.0),
            center: false,
            children: vec![ScadNode::new(ScadKind::Polygon {
                points: vec![
                    IrVec2::new(0.0, 0.0),
                    IrVec2::new(4.0, 0.0),
                    IrVec2::new(4.0, 4.0),
                    IrVec2::new(0.0, 4.0),
                    IrVec2::new(1.0, 1.0),
                    IrVec2::new(3.0, 1.0),
                    IrVec2::new(3.0, 3.0),
                    IrVec2::new(1.0, 3.0),
                ],
                point_locs: vec![],
                paths: vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]],
            })],
        });
        let (root, _, _) = lower_roots(&[ext]).unwrap();
        let CsgNode::Add(add) = root.unwrap() else {
            panic!()
        };
        let CsgNode::Xor(x) = &add.items[0] else {
            panic!("expected XOR of towers");
        };
        assert_eq!(x.xor.len(), 2);
    }

    #[test]
    fn test_extrude_one_zero_scale_axis_unsupported() {
        let ext = ScadNode::new(ScadKind::LinearExtrude {
            height: 1.0,
            slices: 1,
            twist: 0.0,
            scale: IrVec2::new(0.0, 1.0),
            center: false,
            children: vec![ScadNode::new(ScadKind::Square {
                size: IrVec2::new(1.0, 1.0),
                center: false,
            })],
        });
        let err = lower_roots(&[ext]).unwrap_err();
        assert!(matches!(err, CsgError::Unsupported { .. }));
    }

    #[test]
    fn test_extrude_to_apex_when_scale_zero() {
        let ext = ScadNode::new(ScadKind::LinearExtrude {
            height: 3.0,
            slices: 1,
            twist: 0.0,
            scale: IrVec2::new(0.0, 0.0),
            center: false,
            children: vec![ScadNode::new(ScadKind::Square {
                size: IrVec2::new(2.0, 2.0),
                center: true,
            })],
        });
        let (root, _, _) = lower_roots(&[ext]).unwrap();
        let polys_root = root.unwrap();
        let p = leaf_polys(&polys_root)[0];
        // one ring of 4 plus the apex
        assert_eq!(p.points.len(), 5);
        p.check_manifold().unwrap();
        // pyramid volume: base 4, height 3 -> 4
        assert!((mesh_volume(p) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_translate_zero_is_elided() {
        let moved = ScadNode::new(ScadKind::Translate {
            v: IrVec3::new(0.0, 0.0, 0.0),
            children: vec![cube_node(1.0, false)],
        });
        let (_, mats, _) = lower_roots(&[moved]).unwrap();
        // only the identity matrix in the arena: no compose happened
        assert_eq!(mats.len(), 1);
    }

    #[test]
    fn test_deterministic_lowering() {
        let tree = || {
            ScadNode::new(ScadKind::Difference {
                children: vec![
                    cube_node(2.0, true),
                    ScadNode::new(ScadKind::Sphere { r: 1.2, fn_: 16 }),
                ],
            })
        };
        let (a, _, _) = lower_roots(&[tree()]).unwrap();
        let (b, _, _) = lower_roots(&[tree()]).unwrap();
        assert_eq!(a, b);
    }
}
