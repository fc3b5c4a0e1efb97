#![warn(missing_docs)]

//! Math types for the polyscad kernel.
//!
//! Thin wrappers around nalgebra providing the domain-specific pieces the
//! lowering needs: 3x4 affine transforms with a cached determinant, the
//! matrix arena, degree-based trigonometry that is exact at multiples of
//! 90°, tolerance constants, and axis-aligned bounding boxes.

use nalgebra::{Matrix3, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in 2D space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = nalgebra::Vector2<f64>;

/// Linear distance tolerance (mm).
pub const EPS: f64 = 1e-6;

/// Check if two scalars are equal within [`EPS`].
pub fn feq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

/// Check if two points are coincident within [`EPS`].
pub fn pt3_eq(a: &Point3, b: &Point3) -> bool {
    (a - b).norm() < EPS
}

// ============================================================================
// Degree trigonometry
// ============================================================================

/// Sine of an angle in degrees, exact at multiples of 90°.
pub fn sin_deg(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    if r == 0.0 || r == 180.0 {
        0.0
    } else if r == 90.0 {
        1.0
    } else if r == 270.0 {
        -1.0
    } else {
        deg.to_radians().sin()
    }
}

/// Cosine of an angle in degrees, exact at multiples of 90°.
pub fn cos_deg(deg: f64) -> f64 {
    sin_deg(deg + 90.0)
}

// ============================================================================
// Affine transforms
// ============================================================================

/// A 3x4 affine transform: a 3x3 linear block plus a translation column,
/// with the determinant of the linear block cached at construction.
///
/// Never mutated after construction; composition produces a new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    /// The linear 3x3 block.
    pub b: Matrix3<f64>,
    /// The translation column.
    pub w: Vec3,
    det: f64,
}

impl Affine {
    /// Build from a linear block and translation, caching the determinant.
    pub fn new(b: Matrix3<f64>, w: Vec3) -> Self {
        let det = b.determinant();
        Self { b, w, det }
    }

    /// Identity transform.
    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vec3::zeros())
    }

    /// Translation by `v`.
    pub fn translation(v: Vec3) -> Self {
        Self::new(Matrix3::identity(), v)
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scaling(sx: f64, sy: f64, sz: f64) -> Self {
        Self::new(Matrix3::from_diagonal(&Vec3::new(sx, sy, sz)), Vec3::zeros())
    }

    /// Rotation about the X axis by `deg` degrees.
    pub fn rotation_x(deg: f64) -> Self {
        let (s, c) = (sin_deg(deg), cos_deg(deg));
        #[rustfmt::skip]
        let b = Matrix3::new(
            1.0, 0.0, 0.0,
            0.0, c,   -s,
            0.0, s,    c,
        );
        Self::new(b, Vec3::zeros())
    }

    /// Rotation about the Y axis by `deg` degrees.
    pub fn rotation_y(deg: f64) -> Self {
        let (s, c) = (sin_deg(deg), cos_deg(deg));
        #[rustfmt::skip]
        let b = Matrix3::new(
            c,   0.0, s,
            0.0, 1.0, 0.0,
            -s,  0.0, c,
        );
        Self::new(b, Vec3::zeros())
    }

    /// Rotation about the Z axis by `deg` degrees.
    pub fn rotation_z(deg: f64) -> Self {
        let (s, c) = (sin_deg(deg), cos_deg(deg));
        #[rustfmt::skip]
        let b = Matrix3::new(
            c,   -s,  0.0,
            s,    c,  0.0,
            0.0, 0.0, 1.0,
        );
        Self::new(b, Vec3::zeros())
    }

    /// Three-step Euler rotation `Rz * Ry * Rx`, angles in degrees.
    pub fn rotation_euler(x_deg: f64, y_deg: f64, z_deg: f64) -> Self {
        Self::rotation_z(z_deg)
            .then(&Self::rotation_y(y_deg))
            .then(&Self::rotation_x(x_deg))
    }

    /// Rotation about an arbitrary axis through the origin by `deg` degrees.
    ///
    /// Uses Rodrigues' rotation formula. The axis must be non-zero; it is
    /// normalized here.
    pub fn rotation_axis(axis: Vec3, deg: f64) -> Self {
        let u = axis.normalize();
        let (s, c) = (sin_deg(deg), cos_deg(deg));
        let t = 1.0 - c;
        let (x, y, z) = (u.x, u.y, u.z);
        #[rustfmt::skip]
        let b = Matrix3::new(
            t * x * x + c,     t * x * y - s * z, t * x * z + s * y,
            t * x * y + s * z, t * y * y + c,     t * y * z - s * x,
            t * x * z - s * y, t * y * z + s * x, t * z * z + c,
        );
        Self::new(b, Vec3::zeros())
    }

    /// Mirror across the plane through the origin with normal `n`.
    ///
    /// The normal must be non-zero; it is normalized here. The determinant
    /// of the result is -1.
    pub fn mirror(n: Vec3) -> Self {
        let u = n.normalize();
        let b = Matrix3::identity() - 2.0 * u * u.transpose();
        Self::new(b, Vec3::zeros())
    }

    /// Build from the top three rows of a row-major 4x4 matrix.
    pub fn from_rows(rows: &[[f64; 4]; 3]) -> Self {
        #[rustfmt::skip]
        let b = Matrix3::new(
            rows[0][0], rows[0][1], rows[0][2],
            rows[1][0], rows[1][1], rows[1][2],
            rows[2][0], rows[2][1], rows[2][2],
        );
        let w = Vec3::new(rows[0][3], rows[1][3], rows[2][3]);
        Self::new(b, w)
    }

    /// Compose: apply `other` first, then `self` (`self * other`).
    pub fn then(&self, other: &Affine) -> Self {
        Self::new(self.b * other.b, self.b * other.w + self.w)
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        Point3::from(self.b * p.coords + self.w)
    }

    /// Transform a direction vector (ignores translation).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        self.b * v
    }

    /// Determinant of the linear block (cached).
    pub fn det(&self) -> f64 {
        self.det
    }

    /// Whether the transform flips orientation.
    pub fn is_mirror(&self) -> bool {
        self.det < 0.0
    }

    /// Whether the transform is singular (collapses a dimension).
    pub fn is_singular(&self) -> bool {
        self.det.abs() < EPS
    }

    /// Whether the linear block maps axis-aligned boxes to axis-aligned
    /// boxes (exactly one non-zero entry per row). Used to mark polyhedra
    /// for downstream axis-aligned output optimizations.
    pub fn is_rect_rot(&self) -> bool {
        for r in 0..3 {
            let nonzero = (0..3).filter(|&c| self.b[(r, c)].abs() > 1e-12).count();
            if nonzero != 1 {
                return false;
            }
        }
        true
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

// ============================================================================
// Matrix arena
// ============================================================================

/// Stable handle into a [`MatrixStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatId(u32);

impl MatId {
    /// Handle of the identity transform present in every store.
    pub const IDENTITY: MatId = MatId(0);
}

/// Arena owning every matrix created during lowering.
///
/// Matrices are appended once and never mutated; handles stay valid for
/// the lifetime of the store (and therefore of the CSG tree built with it).
#[derive(Debug, Clone)]
pub struct MatrixStore {
    mats: Vec<Affine>,
}

impl MatrixStore {
    /// Create a store seeded with the identity transform.
    pub fn new() -> Self {
        Self {
            mats: vec![Affine::identity()],
        }
    }

    /// Add a matrix, returning its handle.
    pub fn push(&mut self, m: Affine) -> MatId {
        let id = MatId(self.mats.len() as u32);
        self.mats.push(m);
        id
    }

    /// Look up a matrix by handle.
    pub fn get(&self, id: MatId) -> &Affine {
        &self.mats[id.0 as usize]
    }

    /// Compose `cur * op` and store the result.
    pub fn compose(&mut self, cur: MatId, op: &Affine) -> MatId {
        let m = self.get(cur).then(op);
        self.push(m)
    }

    /// Number of matrices in the store.
    pub fn len(&self) -> usize {
        self.mats.len()
    }

    /// Whether the store holds only the identity.
    pub fn is_empty(&self) -> bool {
        self.mats.len() <= 1
    }
}

impl Default for MatrixStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Bounding boxes
// ============================================================================

/// An axis-aligned 3D bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// The empty box (min > max on every axis).
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    /// Whether no point has been added (or an intersection came up empty).
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to include a point.
    pub fn add_point(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Union with another box.
    pub fn union(&self, other: &Aabb3) -> Aabb3 {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Aabb3 {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Intersection with another box (may be empty).
    pub fn intersect(&self, other: &Aabb3) -> Aabb3 {
        Aabb3 {
            min: self.min.sup(&other.min),
            max: self.max.inf(&other.max),
        }
    }

    /// Whether a point lies inside (inclusive, with tolerance).
    pub fn contains(&self, p: &Point3) -> bool {
        p.x >= self.min.x - EPS
            && p.x <= self.max.x + EPS
            && p.y >= self.min.y - EPS
            && p.y <= self.max.y + EPS
            && p.z >= self.min.z - EPS
            && p.z <= self.max.z + EPS
    }
}
