#![warn(missing_docs)]

//! SCAD AST, options and diagnostics for the polyscad kernel.
//!
//! This crate defines the contract between the (external) SCAD parser and
//! the lowering kernel: a tree of tagged nodes, each carrying a source
//! location token, plus the configuration record and the diagnostic sink
//! through which the kernel reports invalid input.
//!
//! The AST is purely declarative — no geometry, just resolved numbers and
//! index arrays. Lowering it into polyhedra is handled by the kernel crates.

use serde::{Deserialize, Serialize};

// ============================================================================
// Source locations
// ============================================================================

/// Opaque handle into the original source text.
///
/// Produced by the parser, consumed only by diagnostics; the kernel never
/// interprets it beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Loc(pub u32);

impl Loc {
    /// Sentinel for generated geometry with no source position.
    pub const NONE: Loc = Loc(u32::MAX);

    /// Whether this is a real source position.
    pub fn is_some(self) -> bool {
        self != Loc::NONE
    }
}

impl Default for Loc {
    fn default() -> Self {
        Loc::NONE
    }
}

// ============================================================================
// Vectors and colors
// ============================================================================

/// 2D vector with f64 components (sketch/polygon coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Vec2 {
    /// Create a new Vec2.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 3D vector with f64 components (conventionally millimeters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new Vec3.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean length.
    pub fn norm_sq(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Whether all components are exactly zero.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

/// RGBA color, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Alpha (1.0 = opaque).
    pub a: f64,
}

impl Rgba {
    /// Create a new color.
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }
}

// ============================================================================
// Modifiers
// ============================================================================

/// Root modifier bitmask (`*`, `!`, `#`, `%` in source).
///
/// Modifiers OR downward through the tree during lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers(pub u8);

impl Modifiers {
    /// No modifiers.
    pub const NONE: Modifiers = Modifiers(0);
    /// `*` — subtree is ignored entirely.
    pub const DISABLE: Modifiers = Modifiers(1);
    /// `!` — only this subtree is rendered.
    pub const SHOW_ONLY: Modifiers = Modifiers(2);
    /// `#` — subtree is highlighted for debugging.
    pub const HIGHLIGHT: Modifiers = Modifiers(4);
    /// `%` — subtree is rendered as background only.
    pub const BACKGROUND: Modifiers = Modifiers(8);

    /// Union of two modifier sets.
    pub fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    /// Whether all bits of `other` are set.
    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }
}

// ============================================================================
// AST nodes
// ============================================================================

/// A rotation specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Rotation {
    /// Three-step Euler form `Rz * Ry * Rx`, angles in degrees.
    Euler {
        /// Rotation angles per axis in degrees.
        angles: Vec3,
    },
    /// Rotation around an axis by an angle in degrees.
    Axis {
        /// Rotation axis (normalized during lowering).
        axis: Vec3,
        /// Angle in degrees.
        angle: f64,
    },
}

/// A node in the SCAD tree: a source location, root modifiers, and the
/// operation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScadNode {
    /// Source position of the node.
    #[serde(default)]
    pub loc: Loc,
    /// Root modifiers attached to this node.
    #[serde(default)]
    pub modifiers: Modifiers,
    /// The operation this node represents.
    pub kind: ScadKind,
}

impl ScadNode {
    /// Create a node with no modifiers and no source position.
    pub fn new(kind: ScadKind) -> Self {
        Self {
            loc: Loc::NONE,
            modifiers: Modifiers::NONE,
            kind,
        }
    }

    /// Create a node at a source position.
    pub fn at(loc: Loc, kind: ScadKind) -> Self {
        Self {
            loc,
            modifiers: Modifiers::NONE,
            kind,
        }
    }
}

/// SCAD operation — one tag per source-language construct.
///
/// Group nodes carry their children inline; primitives carry fully
/// resolved parameters (the parser has already evaluated expressions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScadKind {
    /// Boolean union of the children.
    Union {
        /// Child nodes.
        children: Vec<ScadNode>,
    },
    /// First non-empty child minus the remaining children.
    Difference {
        /// Child nodes.
        children: Vec<ScadNode>,
    },
    /// Boolean intersection of the children.
    Intersection {
        /// Child nodes.
        children: Vec<ScadNode>,
    },
    /// Translation by an offset vector.
    Translate {
        /// Translation offset.
        v: Vec3,
        /// Child nodes.
        children: Vec<ScadNode>,
    },
    /// Non-uniform scale.
    Scale {
        /// Scale factors per axis.
        v: Vec3,
        /// Child nodes.
        children: Vec<ScadNode>,
    },
    /// Rotation (Euler or axis-angle), degrees.
    Rotate {
        /// The rotation.
        rot: Rotation,
        /// Child nodes.
        children: Vec<ScadNode>,
    },
    /// Mirror across the plane through the origin with the given normal.
    Mirror {
        /// Plane normal (must be non-zero).
        v: Vec3,
        /// Child nodes.
        children: Vec<ScadNode>,
    },
    /// Multiplication by a raw affine matrix (row-major 3x4).
    MultMatrix {
        /// The top three rows of the 4x4 matrix.
        rows: [[f64; 4]; 3],
        /// Child nodes.
        children: Vec<ScadNode>,
    },
    /// Color assignment for the subtree.
    Color {
        /// The color.
        rgba: Rgba,
        /// Child nodes.
        children: Vec<ScadNode>,
    },
    /// Extrude a 2D subtree along +Z.
    LinearExtrude {
        /// Extrusion height (must be positive).
        height: f64,
        /// Number of slices along the height (must be at least 1).
        slices: u32,
        /// Total twist over the height, degrees.
        twist: f64,
        /// XY scale of the top relative to the bottom.
        scale: Vec2,
        /// Center along Z instead of starting at z=0.
        center: bool,
        /// Child nodes (2D context).
        children: Vec<ScadNode>,
    },
    /// Sphere centered at origin.
    Sphere {
        /// Radius.
        r: f64,
        /// Number of circular segments (0 = analytic).
        fn_: u32,
    },
    /// Axis-aligned cuboid.
    Cube {
        /// Size along each axis.
        size: Vec3,
        /// Center at the origin instead of the first octant.
        center: bool,
    },
    /// Cylinder or cone along +Z.
    Cylinder {
        /// Height.
        h: f64,
        /// Bottom radius.
        r1: f64,
        /// Top radius (0 for a point).
        r2: f64,
        /// Center along Z.
        center: bool,
        /// Number of circular segments (0 = default faceting).
        fn_: u32,
    },
    /// Explicit polyhedron from points and faces.
    Polyhedron {
        /// Vertex coordinates.
        points: Vec<Vec3>,
        /// Per-point source positions (parallel to `points`; may be empty).
        #[serde(default)]
        point_locs: Vec<Loc>,
        /// Faces as index loops into `points`, clockwise seen from outside.
        faces: Vec<Vec<u32>>,
    },
    /// Circle in the XY plane.
    Circle {
        /// Radius.
        r: f64,
        /// Number of segments (0 = default faceting).
        fn_: u32,
    },
    /// Axis-aligned rectangle in the XY plane.
    Square {
        /// Size along x and y.
        size: Vec2,
        /// Center at the origin.
        center: bool,
    },
    /// Explicit polygon from points and paths.
    Polygon {
        /// Vertex coordinates.
        points: Vec<Vec2>,
        /// Per-point source positions (parallel to `points`; may be empty).
        #[serde(default)]
        point_locs: Vec<Loc>,
        /// Paths as index loops into `points`; empty means one implicit
        /// path over all points in order.
        #[serde(default)]
        paths: Vec<Vec<u32>>,
    },
}

impl ScadKind {
    /// Children of a group node, or an empty slice for primitives.
    pub fn children(&self) -> &[ScadNode] {
        match self {
            ScadKind::Union { children }
            | ScadKind::Difference { children }
            | ScadKind::Intersection { children }
            | ScadKind::Translate { children, .. }
            | ScadKind::Scale { children, .. }
            | ScadKind::Rotate { children, .. }
            | ScadKind::Mirror { children, .. }
            | ScadKind::MultMatrix { children, .. }
            | ScadKind::Color { children, .. }
            | ScadKind::LinearExtrude { children, .. } => children,
            _ => &[],
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Severity assigned to a class of invalid input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Drop silently.
    Ignore,
    /// Report and continue without the offending geometry.
    Warn,
    /// Report and fail the whole operation.
    Fatal,
}

/// Kernel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Maximum number of polygon segments for circular shapes.
    pub max_fn: u32,
    /// Severity of empty geometry (zero radius, zero scale, h <= 0).
    pub err_empty: Severity,
    /// Severity of a collapsing transform (non-invertible multmatrix).
    pub err_collapse: Severity,
    /// Severity of a 2D primitive outside a 2D context.
    pub err_outside_2d: Severity,
    /// Severity of a 3D primitive inside a 2D context.
    pub err_outside_3d: Severity,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_fn: 64,
            err_empty: Severity::Warn,
            err_collapse: Severity::Warn,
            err_outside_2d: Severity::Fatal,
            err_outside_3d: Severity::Fatal,
        }
    }
}

impl Options {
    /// Check option consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_fn < 3 {
            return Err("max_fn must be at least 3".into());
        }
        Ok(())
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// A single diagnostic record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// How bad it is.
    pub severity: Severity,
    /// Primary source position.
    pub loc: Loc,
    /// Secondary source position (e.g. the other duplicate point).
    pub loc2: Option<Loc>,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic with a single source position.
    pub fn new(severity: Severity, loc: Loc, message: impl Into<String>) -> Self {
        Self {
            severity,
            loc,
            loc2: None,
            message: message.into(),
        }
    }

    /// Attach a secondary source position.
    pub fn with_loc2(mut self, loc2: Loc) -> Self {
        self.loc2 = Some(loc2);
        self
    }
}

/// What the sink wants the kernel to do after a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFlow {
    /// Keep going.
    Continue,
    /// Abort the current top-level operation.
    Abort,
}

/// Receiver for diagnostic records.
///
/// The sink may abort the operation (the kernel then returns failure) or
/// accumulate and let the kernel continue.
pub trait DiagSink {
    /// Report one diagnostic.
    fn report(&mut self, diag: Diagnostic) -> SinkFlow;
}

/// A sink that accumulates all diagnostics and never aborts.
#[derive(Debug, Default)]
pub struct DiagBuffer {
    /// All reported diagnostics, in order.
    pub entries: Vec<Diagnostic>,
}

impl DiagBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything at least as bad as `severity` was reported.
    pub fn has_at_least(&self, severity: Severity) -> bool {
        self.entries.iter().any(|d| d.severity >= severity)
    }
}

impl DiagSink for DiagBuffer {
    fn report(&mut self, diag: Diagnostic) -> SinkFlow {
        self.entries.push(diag);
        SinkFlow::Continue
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn rank(s: Severity) -> u8 {
            match s {
                Severity::Ignore => 0,
                Severity::Warn => 1,
                Severity::Fatal => 2,
            }
        }
        rank(*self).cmp(&rank(*other))
    }
}
