#![warn(missing_docs)]

//! Layer slicing for the polyscad kernel.
//!
//! Converts a lowered 3D CSG tree into per-layer polygons: each slice
//! height produces a 2D CSG tree (leaves cut out of the 3D leaves) that
//! the boolean engine reduces to one polygon. Layers are independent
//! and processed in parallel.

pub mod error;
pub mod layer;
pub mod slice;

pub use error::{Result, SlicerError};
pub use layer::{generate_layer_heights, slice_layers, Layer};
pub use slice::slice_csg3;

use serde::{Deserialize, Serialize};

use polyscad_kernel_csg::{csg3_bbox, Csg3};
use polyscad_kernel_math::MatrixStore;

/// Slicing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceSettings {
    /// Layer height (model units).
    pub layer_height: f64,
    /// Maximum polygon segments for analytic shapes cut at a layer.
    pub max_fn: u32,
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self {
            layer_height: 0.2,
            max_fn: 64,
        }
    }
}

impl SliceSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.layer_height <= 0.0 {
            return Err(SlicerError::InvalidSettings(
                "layer_height must be positive".into(),
            ));
        }
        if self.max_fn < 3 {
            return Err(SlicerError::InvalidSettings(
                "max_fn must be at least 3".into(),
            ));
        }
        Ok(())
    }
}

/// Slice a whole model: derive the z range from its bounding box, then
/// reduce every layer.
pub fn slice_model(
    root: &Csg3,
    mats: &MatrixStore,
    settings: &SliceSettings,
) -> Result<Vec<Layer>> {
    settings.validate()?;
    let bb = csg3_bbox(root, mats, false);
    if bb.is_empty() {
        return Err(SlicerError::EmptyModel);
    }
    let zs = generate_layer_heights(bb.min.z, bb.max.z, settings.layer_height);
    slice_layers(root, mats, settings.max_fn, &zs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyscad_ir::{DiagBuffer, Options, ScadKind, ScadNode, Vec3 as IrVec3};
    use polyscad_kernel_csg::lower;
    use polyscad_kernel_poly::EarClip;

    #[test]
    fn test_invalid_settings() {
        let s = SliceSettings {
            layer_height: 0.0,
            ..SliceSettings::default()
        };
        assert!(s.validate().is_err());
        let s = SliceSettings {
            max_fn: 2,
            ..SliceSettings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_slice_model_cube() {
        let opt = Options::default();
        let mut mats = MatrixStore::new();
        let mut sink = DiagBuffer::new();
        let root = lower(
            &opt,
            &mut mats,
            &mut sink,
            &EarClip,
            &[ScadNode::new(ScadKind::Cube {
                size: IrVec3::new(1.0, 1.0, 1.0),
                center: false,
            })],
        )
        .unwrap()
        .unwrap();
        let layers = slice_model(
            &root,
            &mats,
            &SliceSettings {
                layer_height: 0.25,
                max_fn: 64,
            },
        )
        .unwrap();
        assert_eq!(layers.len(), 4);
        assert!(layers.iter().all(|l| l.polygon.is_some()));
    }
}
