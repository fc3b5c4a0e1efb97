#![warn(missing_docs)]

//! polyscad — CSG lowering to watertight polyhedra and layer polygons.
//!
//! This facade crate ties the kernel together: it takes a parsed SCAD
//! tree ([`polyscad_ir::ScadNode`]), lowers it into a 3D CSG tree of
//! edge-paired polyhedra and analytic spheres, and slices that tree
//! into per-layer 2D polygons via the plane-sweep boolean engine.
//!
//! # Example
//!
//! ```
//! use polyscad::ir::{Options, ScadKind, ScadNode, Vec3};
//! use polyscad::{compile, SliceSettings};
//!
//! let tree = ScadNode::new(ScadKind::Cube {
//!     size: Vec3::new(1.0, 1.0, 1.0),
//!     center: false,
//! });
//! let model = compile(&[tree], &Options::default())
//!     .expect("compiles")
//!     .expect("non-empty");
//! let layers = model.slice(&SliceSettings::default()).expect("slices");
//! assert!(!layers.is_empty());
//! ```

pub use polyscad_ir as ir;
pub use polyscad_kernel_booleans as booleans;
pub use polyscad_kernel_csg as csg;
pub use polyscad_kernel_math as math;
pub use polyscad_kernel_poly as poly;
pub use polyscad_slicer as slicer;

pub use polyscad_kernel_booleans::{bool_op, BoolOp};
pub use polyscad_kernel_csg::{csg3_bbox, Csg3};
pub use polyscad_slicer::{Layer, SliceSettings};

use anyhow::{Context, Result};
use polyscad_ir::{DiagBuffer, Options, ScadNode};
use polyscad_kernel_math::{Aabb3, MatrixStore};
use polyscad_kernel_poly::EarClip;

/// A compiled model: the 3D CSG tree plus the matrix arena that owns
/// its transforms and the diagnostics gathered while lowering.
#[derive(Debug)]
pub struct Compiled {
    /// Root of the 3D CSG tree.
    pub root: Csg3,
    /// Matrix arena referenced by the tree's leaves.
    pub mats: MatrixStore,
    /// Diagnostics accumulated during lowering.
    pub diagnostics: DiagBuffer,
    /// The options the model was compiled with.
    pub options: Options,
}

impl Compiled {
    /// Bounding box of the model. With `include_sub`, subtracted and
    /// intersected-away volume still counts (conservative bound).
    pub fn bounds(&self, include_sub: bool) -> Aabb3 {
        csg3_bbox(&self.root, &self.mats, include_sub)
    }

    /// Slice the model into per-layer polygons.
    pub fn slice(&self, settings: &SliceSettings) -> Result<Vec<Layer>> {
        polyscad_slicer::slice_model(&self.root, &self.mats, settings)
            .context("slicing failed")
    }
}

/// Compile a SCAD forest into a 3D CSG tree.
///
/// Returns `Ok(None)` when the input lowers to nothing. On `Err` the
/// partial tree and its arena are discarded together, matching the
/// all-or-nothing contract of the lowering.
pub fn compile(roots: &[ScadNode], options: &Options) -> Result<Option<Compiled>> {
    options
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid options")?;
    let mut mats = MatrixStore::new();
    let mut sink = DiagBuffer::new();
    let root = polyscad_kernel_csg::lower(options, &mut mats, &mut sink, &EarClip, roots)
        .context("lowering failed")?;
    Ok(root.map(|root| Compiled {
        root,
        mats,
        diagnostics: sink,
        options: *options,
    }))
}
