//! The layer driver: reduce the per-layer 2D tree for every slice.
//!
//! Layers are independent reductions over a shared read-only tree, so
//! they run in parallel.

use rayon::prelude::*;

use polyscad_kernel_csg::{reduce_csg2, Csg3};
use polyscad_kernel_math::MatrixStore;
use polyscad_kernel_poly::Polygon2;

use crate::error::Result;
use crate::slice::slice_csg3;

/// One slice of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Z height of this layer.
    pub z: f64,
    /// Layer index (0 = first layer).
    pub index: usize,
    /// Reduced polygon, or `None` for an empty layer.
    pub polygon: Option<Polygon2>,
}

/// Slice and reduce the model at every height in `zs`.
pub fn slice_layers(
    root: &Csg3,
    mats: &MatrixStore,
    max_fn: u32,
    zs: &[f64],
) -> Result<Vec<Layer>> {
    zs.par_iter()
        .enumerate()
        .map(|(index, &z)| {
            let polygon = match slice_csg3(root, mats, max_fn, z) {
                Some(tree) => reduce_csg2(&tree)?,
                None => None,
            };
            Ok(Layer { z, index, polygon })
        })
        .collect()
}

/// Generate slice heights through `[z_min, z_max]`, placed mid-layer so
/// slices avoid coplanar faces at layer boundaries.
pub fn generate_layer_heights(z_min: f64, z_max: f64, layer_height: f64) -> Vec<f64> {
    let mut heights = Vec::new();
    if z_max <= z_min || layer_height <= 0.0 {
        return heights;
    }
    let mut z = z_min + layer_height / 2.0;
    while z < z_max {
        heights.push(z);
        z += layer_height;
    }
    heights
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyscad_ir::{DiagBuffer, Options, ScadKind, ScadNode, Vec3 as IrVec3};
    use polyscad_kernel_csg::lower;
    use polyscad_kernel_poly::EarClip;

    #[test]
    fn test_generate_layer_heights() {
        let hs = generate_layer_heights(0.0, 1.0, 0.25);
        assert_eq!(hs.len(), 4);
        assert!((hs[0] - 0.125).abs() < 1e-12);
        assert!(*hs.last().unwrap() < 1.0);
        assert!(generate_layer_heights(1.0, 0.0, 0.25).is_empty());
    }

    #[test]
    fn test_layers_over_cube() {
        let opt = Options::default();
        let mut mats = MatrixStore::new();
        let mut sink = DiagBuffer::new();
        let root = lower(
            &opt,
            &mut mats,
            &mut sink,
            &EarClip,
            &[ScadNode::new(ScadKind::Cube {
                size: IrVec3::new(2.0, 2.0, 1.0),
                center: false,
            })],
        )
        .unwrap()
        .unwrap();

        let zs = generate_layer_heights(0.0, 1.0, 0.25);
        let layers = slice_layers(&root, &mats, 64, &zs).unwrap();
        assert_eq!(layers.len(), 4);
        for layer in &layers {
            let poly = layer.polygon.as_ref().expect("cube layer non-empty");
            assert!((poly.area() - 4.0).abs() < 1e-6);
        }
        // determinism across parallel runs
        let again = slice_layers(&root, &mats, 64, &zs).unwrap();
        assert_eq!(layers, again);
    }

    #[test]
    fn test_empty_layer_above_model() {
        let opt = Options::default();
        let mut mats = MatrixStore::new();
        let mut sink = DiagBuffer::new();
        let root = lower(
            &opt,
            &mut mats,
            &mut sink,
            &EarClip,
            &[ScadNode::new(ScadKind::Sphere { r: 1.0, fn_: 8 })],
        )
        .unwrap()
        .unwrap();
        let layers = slice_layers(&root, &mats, 64, &[5.0]).unwrap();
        assert_eq!(layers.len(), 1);
        assert!(layers[0].polygon.is_none());
    }
}
