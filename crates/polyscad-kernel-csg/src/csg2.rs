//! Reduction of a 2D CSG tree to one polygon via the boolean engine.
//!
//! ADD folds children pairwise, SUB reduces each side and subtracts
//! once, CUT folds intersection with an empty-result early exit, XOR
//! folds symmetric difference. `None` means an empty result.

use polyscad_kernel_booleans::{bool_op, BoolOp};
use polyscad_kernel_poly::Polygon2;

use crate::error::Result;
use crate::{Csg2, CsgNode};

/// Reduce one 2D CSG node to a polygon (`None` = empty).
pub fn reduce_csg2(node: &Csg2) -> Result<Option<Polygon2>> {
    match node {
        CsgNode::Leaf(l) => Ok(if l.polygon.is_empty() {
            None
        } else {
            Some(l.polygon.clone())
        }),
        CsgNode::Add(a) => reduce_add(&a.items),
        CsgNode::Sub(s) => {
            let Some(pos) = reduce_add(&s.add.items)? else {
                return Ok(None);
            };
            match reduce_add(&s.sub.items)? {
                None => Ok(Some(pos)),
                Some(neg) => {
                    let out = bool_op(&pos, &neg, BoolOp::Sub)?;
                    Ok((!out.is_empty()).then_some(out))
                }
            }
        }
        CsgNode::Cut(c) => {
            let mut acc: Option<Polygon2> = None;
            for operand in &c.cut {
                let Some(p) = reduce_add(&operand.items)? else {
                    return Ok(None);
                };
                acc = match acc {
                    None => Some(p),
                    Some(prev) => {
                        let out = bool_op(&prev, &p, BoolOp::Cut)?;
                        if out.is_empty() {
                            return Ok(None);
                        }
                        Some(out)
                    }
                };
            }
            Ok(acc)
        }
        CsgNode::Xor(x) => {
            let mut acc: Option<Polygon2> = None;
            for operand in &x.xor {
                acc = match (acc, reduce_add(&operand.items)?) {
                    (acc, None) => acc,
                    (None, some) => some,
                    (Some(prev), Some(q)) => {
                        let out = bool_op(&prev, &q, BoolOp::Xor)?;
                        (!out.is_empty()).then_some(out)
                    }
                };
            }
            Ok(acc)
        }
    }
}

/// Union-fold a list of 2D nodes.
pub(crate) fn reduce_add(items: &[Csg2]) -> Result<Option<Polygon2>> {
    let mut acc: Option<Polygon2> = None;
    for item in items {
        acc = match (acc, reduce_csg2(item)?) {
            (acc, None) => acc,
            (None, some) => some,
            (Some(prev), Some(q)) => {
                let out = bool_op(&prev, &q, BoolOp::Add)?;
                (!out.is_empty()).then_some(out)
            }
        };
    }
    Ok(acc)
}
