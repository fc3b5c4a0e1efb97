#![warn(missing_docs)]

//! Plane-sweep 2D boolean engine for the polyscad kernel.
//!
//! Combines two polygon sets under union, difference, intersection or
//! symmetric difference, producing non-self-intersecting output paths:
//! outer contours counter-clockwise, holes clockwise.
//!
//! The sweep proceeds in 4 stages:
//! 1. **Rasterize** — snap every coordinate to a binary grid and intern
//!    it, so point equality is id equality
//! 2. **Queue** — one left and one right event per input segment
//! 3. **Sweep** — drain events in order, dividing edges at intersections
//!    and cancelling collinear duplicates, while tracking per-edge owner
//!    and interior-below masks
//! 4. **Assemble** — link boundary edges into chains, close them into
//!    rings, and orient each ring from its closing edge

mod chain;
mod error;
mod event;
mod point;
mod sweep;

pub use error::{BoolError, Result};
pub use point::GRID;

use polyscad_kernel_poly::Polygon2;

/// Boolean operator over two polygon sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    /// Union.
    Add,
    /// A minus B.
    Sub,
    /// Intersection.
    Cut,
    /// Symmetric difference.
    Xor,
}

/// Combine two polygons under `op`.
///
/// Inputs may be wound either way (the owner-parity bookkeeping is
/// winding-agnostic); output paths are canonically wound.
pub fn bool_op(a: &Polygon2, b: &Polygon2, op: BoolOp) -> Result<Polygon2> {
    // trivial operands
    if b.is_empty() {
        return Ok(match op {
            BoolOp::Cut => Polygon2::new(),
            _ => a.clone(),
        });
    }
    if a.is_empty() {
        return Ok(match op {
            BoolOp::Cut | BoolOp::Sub => Polygon2::new(),
            BoolOp::Add | BoolOp::Xor => b.clone(),
        });
    }

    // disjoint bounding boxes
    if let (Some((amin, amax)), Some((bmin, bmax))) = (a.bbox(), b.bbox()) {
        let disjoint = amax.x + GRID < bmin.x
            || bmax.x + GRID < amin.x
            || amax.y + GRID < bmin.y
            || bmax.y + GRID < amin.y;
        if disjoint {
            return Ok(match op {
                BoolOp::Cut => Polygon2::new(),
                BoolOp::Sub => a.clone(),
                BoolOp::Add | BoolOp::Xor => {
                    let mut out = a.clone();
                    out.append(b);
                    out
                }
            });
        }
    }

    sweep::Sweep::run(a, b, op)
}
