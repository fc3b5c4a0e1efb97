//! 2D polygons: a point vector plus index paths.
//!
//! Canonical winding convention: outer contours are counter-clockwise
//! (positive signed area), holes are clockwise. Primitive constructors
//! canonicalize every path to CCW; hole windings are established by the
//! boolean engine's output orientation.

use polyscad_ir::{Loc, Rgba};
use polyscad_kernel_math::Point2;

/// A 2D point with color and source position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex2 {
    /// Coordinate.
    pub coord: Point2,
    /// Color inherited from the graphics context.
    pub color: Rgba,
    /// Source position (diagnostics only).
    pub loc: Loc,
}

impl Vertex2 {
    /// Create a vertex.
    pub fn new(coord: Point2, color: Rgba, loc: Loc) -> Self {
        Self { coord, color, loc }
    }
}

/// One closed path: an ordered loop of indices into the owning polygon's
/// point vector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path2 {
    /// Point indices, in loop order.
    pub indices: Vec<u32>,
}

impl Path2 {
    /// Create a path from indices.
    pub fn new(indices: Vec<u32>) -> Self {
        Self { indices }
    }
}

/// A set of closed paths over a shared point vector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon2 {
    /// Point vector.
    pub points: Vec<Vertex2>,
    /// Paths (index loops).
    pub paths: Vec<Path2>,
}

impl Polygon2 {
    /// Create an empty polygon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the polygon has no geometry.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() || self.paths.iter().all(|p| p.indices.len() < 3)
    }

    /// Append a point, returning its index.
    pub fn push_point(&mut self, coord: Point2, color: Rgba, loc: Loc) -> u32 {
        let i = self.points.len() as u32;
        self.points.push(Vertex2::new(coord, color, loc));
        i
    }

    /// Coordinate of a point by index.
    pub fn coord(&self, i: u32) -> Point2 {
        self.points[i as usize].coord
    }

    /// Signed area of one path (positive = CCW).
    pub fn path_area(&self, path: &Path2) -> f64 {
        let n = path.indices.len();
        let mut area = 0.0;
        for i in 0..n {
            let a = self.coord(path.indices[i]);
            let b = self.coord(path.indices[(i + 1) % n]);
            area += a.x * b.y - b.x * a.y;
        }
        area / 2.0
    }

    /// Sum of signed path areas (holes subtract).
    pub fn area(&self) -> f64 {
        self.paths.iter().map(|p| self.path_area(p)).sum()
    }

    /// Make every path counter-clockwise by signed-area reversal.
    pub fn canonicalize(&mut self) {
        let flips: Vec<bool> = self
            .paths
            .iter()
            .map(|p| self.path_area(p) < 0.0)
            .collect();
        for (path, flip) in self.paths.iter_mut().zip(flips) {
            if flip {
                path.indices.reverse();
            }
        }
    }

    /// Bounding box over all points referenced by paths, or `None` if empty.
    pub fn bbox(&self) -> Option<(Point2, Point2)> {
        let mut it = self
            .paths
            .iter()
            .flat_map(|p| p.indices.iter())
            .map(|&i| self.coord(i));
        let first = it.next()?;
        let mut min = first;
        let mut max = first;
        for p in it {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }

    /// Append all of `other`'s paths (re-indexed) to `self`.
    pub fn append(&mut self, other: &Polygon2) {
        let base = self.points.len() as u32;
        self.points.extend(other.points.iter().cloned());
        for path in &other.paths {
            self.paths.push(Path2::new(
                path.indices.iter().map(|&i| i + base).collect(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyscad_ir::{Loc, Rgba};

    fn square(shift_x: f64) -> Polygon2 {
        let mut poly = Polygon2::new();
        let c = Rgba::default();
        let pts = [
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
        ];
        let idx: Vec<u32> = pts
            .iter()
            .map(|&(x, y)| poly.push_point(Point2::new(x + shift_x, y), c, Loc::NONE))
            .collect();
        poly.paths.push(Path2::new(idx));
        poly
    }

    #[test]
    fn test_area_and_canonicalize() {
        let mut poly = square(0.0);
        assert!((poly.area() - 1.0).abs() < 1e-12);
        poly.paths[0].indices.reverse();
        assert!((poly.area() + 1.0).abs() < 1e-12);
        poly.canonicalize();
        assert!((poly.area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bbox() {
        let poly = square(2.0);
        let (min, max) = poly.bbox().unwrap();
        assert_eq!(min, Point2::new(2.0, 0.0));
        assert_eq!(max, Point2::new(3.0, 1.0));
        assert!(Polygon2::new().bbox().is_none());
    }

    #[test]
    fn test_append_reindexes() {
        let mut a = square(0.0);
        let b = square(5.0);
        a.append(&b);
        assert_eq!(a.paths.len(), 2);
        assert_eq!(a.points.len(), 8);
        assert_eq!(a.paths[1].indices, vec![4, 5, 6, 7]);
        assert!((a.area() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty() {
        assert!(Polygon2::new().is_empty());
        assert!(!square(0.0).is_empty());
    }
}
