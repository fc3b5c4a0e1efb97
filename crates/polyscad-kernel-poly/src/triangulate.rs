//! Triangulation of simple (possibly non-convex) polygon rings.
//!
//! The kernel only ever needs this for faces that fail the convexity
//! check, so the implementation is a plain ear-clipping pass over the
//! projected ring.

use crate::error::{PolyError, Result};
use polyscad_kernel_math::Point2;

/// Twice the signed area of a ring (positive = counter-clockwise).
pub fn ring_signed_area(ring: &[Point2]) -> f64 {
    let n = ring.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += ring[i].x * ring[j].y - ring[j].x * ring[i].y;
    }
    area / 2.0
}

/// Whether all turns of the ring have the same sign (or are straight).
pub fn ring_is_convex(ring: &[Point2]) -> bool {
    let n = ring.len();
    if n < 4 {
        return true;
    }
    let mut pos = false;
    let mut neg = false;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let c = ring[(i + 2) % n];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross > 1e-12 {
            pos = true;
        } else if cross < -1e-12 {
            neg = true;
        }
        if pos && neg {
            return false;
        }
    }
    true
}

/// Triangulates a simple polygon ring.
///
/// Returned triangles index into the input ring and are wound the same
/// direction as the ring itself.
pub trait FaceTriangulator {
    /// Triangulate `ring` into `ring.len() - 2` triangles.
    fn triangulate(&self, ring: &[Point2]) -> Result<Vec<[usize; 3]>>;
}

/// Ear-clipping triangulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarClip;

fn cross(o: Point2, a: Point2, b: Point2) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Strict point-in-triangle test (boundary does not count).
fn strictly_inside(p: Point2, a: Point2, b: Point2, c: Point2) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);
    (d1 > 1e-12 && d2 > 1e-12 && d3 > 1e-12) || (d1 < -1e-12 && d2 < -1e-12 && d3 < -1e-12)
}

impl FaceTriangulator for EarClip {
    fn triangulate(&self, ring: &[Point2]) -> Result<Vec<[usize; 3]>> {
        let n = ring.len();
        if n < 3 {
            return Err(PolyError::Internal("triangulating ring with < 3 points".into()));
        }

        // Work in counter-clockwise order; remember whether we flipped.
        let flipped = ring_signed_area(ring) < 0.0;
        let mut idx: Vec<usize> = if flipped {
            (0..n).rev().collect()
        } else {
            (0..n).collect()
        };

        let mut tris = Vec::with_capacity(n - 2);
        while idx.len() > 3 {
            let m = idx.len();
            let mut clipped = false;
            for i in 0..m {
                let ia = idx[(i + m - 1) % m];
                let ib = idx[i];
                let ic = idx[(i + 1) % m];
                let turn = cross(ring[ia], ring[ib], ring[ic]);
                if turn < -1e-12 {
                    continue; // reflex corner
                }
                // Collinear corners are clipped too (zero-area ear) so that
                // every ring vertex ends up referenced by some triangle.
                let blocked = idx.iter().any(|&ip| {
                    ip != ia
                        && ip != ib
                        && ip != ic
                        && strictly_inside(ring[ip], ring[ia], ring[ib], ring[ic])
                });
                if blocked {
                    continue;
                }
                tris.push([ia, ib, ic]);
                idx.remove(i);
                clipped = true;
                break;
            }
            if !clipped {
                return Err(PolyError::Internal("ear clipping found no ear".into()));
            }
        }
        tris.push([idx[0], idx[1], idx[2]]);

        if flipped {
            for t in &mut tris {
                t.swap(0, 2);
            }
        }
        Ok(tris)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn tri_area(ring: &[Point2], t: [usize; 3]) -> f64 {
        cross(ring[t[0]], ring[t[1]], ring[t[2]]) / 2.0
    }

    #[test]
    fn test_signed_area() {
        let sq = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        assert!((ring_signed_area(&sq) - 1.0).abs() < 1e-12);
        let rev: Vec<_> = sq.iter().rev().cloned().collect();
        assert!((ring_signed_area(&rev) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_convexity() {
        let sq = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        assert!(ring_is_convex(&sq));
        let l = [
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 2.0),
            p(0.0, 2.0),
        ];
        assert!(!ring_is_convex(&l));
    }

    #[test]
    fn test_triangulate_convex() {
        let sq = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        let tris = EarClip.triangulate(&sq).unwrap();
        assert_eq!(tris.len(), 2);
        let total: f64 = tris.iter().map(|&t| tri_area(&sq, t)).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_triangulate_l_shape() {
        let l = [
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 2.0),
            p(0.0, 2.0),
        ];
        let tris = EarClip.triangulate(&l).unwrap();
        assert_eq!(tris.len(), 4);
        let total: f64 = tris.iter().map(|&t| tri_area(&l, t)).sum();
        assert!((total - 3.0).abs() < 1e-12);
        // All triangles wound like the (CCW) input
        for &t in &tris {
            assert!(tri_area(&l, t) >= -1e-12);
        }
    }

    #[test]
    fn test_triangulate_clockwise_input_keeps_winding() {
        let sq_cw = [p(0.0, 0.0), p(0.0, 1.0), p(1.0, 1.0), p(1.0, 0.0)];
        let tris = EarClip.triangulate(&sq_cw).unwrap();
        let total: f64 = tris.iter().map(|&t| tri_area(&sq_cw, t)).sum();
        assert!((total + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_triangulate_with_collinear_vertex() {
        // Square with a redundant midpoint on the bottom edge
        let ring = [
            p(0.0, 0.0),
            p(0.5, 0.0),
            p(1.0, 0.0),
            p(1.0, 1.0),
            p(0.0, 1.0),
        ];
        let tris = EarClip.triangulate(&ring).unwrap();
        assert_eq!(tris.len(), 3);
        let total: f64 = tris.iter().map(|&t| tri_area(&ring, t)).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}
