#![warn(missing_docs)]

//! CSG tree lowering for the polyscad kernel.
//!
//! Walks a SCAD AST, threading a current transform (owned by the matrix
//! arena) and a graphics context down the recursion, and produces a CSG
//! tree of ADD/SUB/CUT/XOR nodes over polyhedral leaves. 3D primitives
//! are built as towers of stacked cross-sections and validated by edge
//! pairing; 2D primitives become canonical polygons.
//!
//! The ADD/SUB/CUT/XOR shape is shared between the 3D tree (what the
//! slicer consumes) and the per-layer 2D tree (what the boolean engine
//! reduces), so the node types here are generic over the leaf.

pub mod bbox;
mod csg2;
pub mod error;
mod extrude;
pub mod lower;
mod prim2;
mod prim3;
pub mod tower;

pub use bbox::csg3_bbox;
pub use csg2::reduce_csg2;
pub use error::{CsgError, Result};
pub use lower::lower;
pub use tower::{build_tower, TowerSpec, TriSide};

use polyscad_ir::{Loc, Modifiers, Rgba};
use polyscad_kernel_math::MatId;
use polyscad_kernel_poly::{Polygon2, Polyhedron};

/// Graphics context threaded through lowering: color plus the modifier
/// bits accumulated from root operators. Passed by value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Gc {
    /// Current color.
    pub color: Rgba,
    /// Accumulated modifier bits.
    pub modifiers: Modifiers,
}

/// A CSG tree node, generic over the leaf type.
#[derive(Debug, Clone, PartialEq)]
pub enum CsgNode<L> {
    /// Union of a sequence of children.
    Add(AddNode<L>),
    /// Positive side minus negative side.
    Sub(Box<SubNode<L>>),
    /// Intersection of the operands.
    Cut(CutNode<L>),
    /// Symmetric difference of the operands.
    Xor(XorNode<L>),
    /// A primitive.
    Leaf(L),
}

/// Union payload.
#[derive(Debug, Clone, PartialEq)]
pub struct AddNode<L> {
    /// Children, unioned.
    pub items: Vec<CsgNode<L>>,
}

/// Difference payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SubNode<L> {
    /// Positive side.
    pub add: AddNode<L>,
    /// Negative side (subtracted).
    pub sub: AddNode<L>,
}

/// Intersection payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CutNode<L> {
    /// Operands; the result is their intersection.
    pub cut: Vec<AddNode<L>>,
}

/// Symmetric-difference payload.
#[derive(Debug, Clone, PartialEq)]
pub struct XorNode<L> {
    /// Operands; the result keeps odd-parity coverage.
    pub xor: Vec<AddNode<L>>,
}

/// An analytic (unfaceted) sphere: the unit sphere mapped by a matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere3 {
    /// Transform from the unit sphere, owned by the matrix arena.
    pub mat: MatId,
    /// Graphics context.
    pub gc: Gc,
    /// Source position.
    pub loc: Loc,
}

/// A polyhedral leaf; its points are already in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Poly3 {
    /// The mesh.
    pub poly: Polyhedron,
    /// Graphics context.
    pub gc: Gc,
    /// Source position.
    pub loc: Loc,
}

/// 3D leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf3 {
    /// Analytic sphere.
    Sphere(Sphere3),
    /// Polyhedral mesh.
    Poly(Poly3),
}

/// 2D leaf: a polygon slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf2 {
    /// The polygon.
    pub polygon: Polygon2,
    /// Graphics context.
    pub gc: Gc,
    /// Source position.
    pub loc: Loc,
}

/// The 3D CSG tree.
pub type Csg3 = CsgNode<Leaf3>;

/// The per-layer 2D CSG tree.
pub type Csg2 = CsgNode<Leaf2>;

impl<L> CsgNode<L> {
    /// Wrap a list of children in an ADD node.
    pub fn add(items: Vec<CsgNode<L>>) -> Self {
        CsgNode::Add(AddNode { items })
    }
}

/// Effective segment count for a shape that must be faceted: `0` means
/// "as fine as allowed", anything else is clamped to `[3, max_fn]`.
pub fn effective_fn(fn_: u32, max_fn: u32) -> u32 {
    if fn_ == 0 {
        max_fn
    } else {
        fn_.clamp(3, max_fn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_fn() {
        assert_eq!(effective_fn(0, 64), 64);
        assert_eq!(effective_fn(2, 64), 3);
        assert_eq!(effective_fn(16, 64), 16);
        assert_eq!(effective_fn(1000, 64), 64);
    }

    #[test]
    fn test_add_helper() {
        let node: Csg3 = CsgNode::add(vec![]);
        match node {
            CsgNode::Add(a) => assert!(a.items.is_empty()),
            _ => panic!("expected Add"),
        }
    }
}
