//! Rasterized sweep points.
//!
//! Every coordinate entering the sweep is snapped to a binary grid, then
//! deduplicated through a dictionary, so equal coordinates become one
//! point id and all downstream equality is id equality.

use std::collections::HashMap;

use polyscad_ir::{Loc, Rgba};
use polyscad_kernel_math::Point2;

/// Grid size for coordinate rasterization (a power of two, so snapping
/// is exact in floating point).
pub const GRID: f64 = 1.0 / 8192.0;

/// Snap one coordinate to the grid, returning the grid index.
pub fn snap(c: f64) -> i64 {
    (c / GRID).round() as i64
}

/// Id of a canonical sweep point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pt(pub u32);

/// A canonical rasterized point.
#[derive(Debug, Clone, Copy)]
pub struct RasterPoint {
    /// Grid index along x.
    pub ix: i64,
    /// Grid index along y.
    pub iy: i64,
    /// Color of the first contributing input point.
    pub color: Rgba,
    /// Source position of the first contributing input point.
    pub loc: Loc,
    /// Cached index into the output polygon's point vector.
    pub out: Option<u32>,
}

impl RasterPoint {
    /// Snapped coordinate as floats (exact, the grid is binary).
    pub fn coord(&self) -> Point2 {
        Point2::new(self.ix as f64 * GRID, self.iy as f64 * GRID)
    }
}

/// Deduplicating store of sweep points.
#[derive(Debug, Default)]
pub struct PointStore {
    points: Vec<RasterPoint>,
    index: HashMap<(i64, i64), Pt>,
}

impl PointStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snap and intern a coordinate. Color and location stick from the
    /// first contributor.
    pub fn insert(&mut self, x: f64, y: f64, color: Rgba, loc: Loc) -> Pt {
        let key = (snap(x), snap(y));
        if let Some(&p) = self.index.get(&key) {
            return p;
        }
        let p = Pt(self.points.len() as u32);
        self.points.push(RasterPoint {
            ix: key.0,
            iy: key.1,
            color,
            loc,
            out: None,
        });
        self.index.insert(key, p);
        p
    }

    /// Look up a point.
    pub fn get(&self, p: Pt) -> &RasterPoint {
        &self.points[p.0 as usize]
    }

    /// Grid key of a point.
    pub fn key(&self, p: Pt) -> (i64, i64) {
        let rp = self.get(p);
        (rp.ix, rp.iy)
    }

    /// Snapped coordinate of a point.
    pub fn coord(&self, p: Pt) -> Point2 {
        self.get(p).coord()
    }

    /// Lexicographic sweep order: by x, then y.
    pub fn cmp_pt(&self, a: Pt, b: Pt) -> std::cmp::Ordering {
        self.key(a).cmp(&self.key(b))
    }

    /// Cached output index for a point, allocating through `alloc` on
    /// first use.
    pub fn out_index(&mut self, p: Pt, alloc: impl FnOnce(&RasterPoint) -> u32) -> u32 {
        if let Some(i) = self.points[p.0 as usize].out {
            return i;
        }
        let i = alloc(&self.points[p.0 as usize]);
        self.points[p.0 as usize].out = Some(i);
        i
    }
}
