//! Layer-resolved basis for the valence window.
//!
//! The density matrix $D=\sum_n\ket{v_n}\bra{v_n}$ of the selected states is
//! projected onto each layer, $P_l D P_l$, and the eigenvectors with
//! non-negligible weight become the basis vectors of that layer. The result
//! spans the same space as the selected states only when their count equals
//! the window size, which is checked; every vector lives in a single layer.
use crate::band::ValenceWindow;
use crate::config::KpConfig;
use crate::error::{KpError, Result};
use crate::math::{density_matrix, eigh, orthonormality_deviation};
use ndarray::prelude::*;
use ndarray::Data;
use num_complex::Complex64;

/// Diagonal 0/1 projectors onto the orbitals of each layer.
#[derive(Debug, Clone)]
pub struct LayerProjector {
    pub num_layers: usize,
    layer_of_orbital: Vec<usize>,
}

impl LayerProjector {
    pub fn new(config: &KpConfig) -> LayerProjector {
        LayerProjector {
            num_layers: config.num_layers,
            layer_of_orbital: config.layout.layer_of_orbital(config.num_layers),
        }
    }

    pub fn norb(&self) -> usize {
        self.layer_of_orbital.len()
    }

    pub fn layer_of_orbital(&self) -> &[usize] {
        &self.layer_of_orbital
    }

    /// $P_l$ as a dense matrix.
    pub fn matrix(&self, layer: usize) -> Array2<Complex64> {
        let diag = Array1::from_iter(self.layer_of_orbital.iter().map(|&l| {
            if l == layer {
                Complex64::new(1.0, 0.0)
            } else {
                Complex64::new(0.0, 0.0)
            }
        }));
        Array2::from_diag(&diag)
    }

    /// $P_l M P_l$: rows and columns outside the layer are zeroed.
    pub fn project<S>(&self, layer: usize, m: &ArrayBase<S, Ix2>) -> Array2<Complex64>
    where
        S: Data<Elem = Complex64>,
    {
        let mut out = m.to_owned();
        for ((i, j), x) in out.indexed_iter_mut() {
            if self.layer_of_orbital[i] != layer || self.layer_of_orbital[j] != layer {
                *x = Complex64::new(0.0, 0.0);
            }
        }
        out
    }
}

/// Fails with [`KpError::NonOrthonormalBasis`] when $V^\dagger V$ deviates from
/// the identity by more than `tol` anywhere.
pub fn check_orthonormal<S>(vectors: &ArrayBase<S, Ix2>, tol: f64) -> Result<()>
where
    S: Data<Elem = Complex64>,
{
    let (i, j, deviation) = orthonormality_deviation(vectors);
    if deviation > tol {
        return Err(KpError::NonOrthonormalBasis { i, j, deviation });
    }
    Ok(())
}

/// Orthonormal basis of the valence window, grouped by layer.
#[derive(Debug, Clone)]
pub struct LayerBasis {
    /// one basis vector per column
    pub vectors: Array2<Complex64>,
    /// layer of each column
    pub layers: Vec<usize>,
    /// eigenvalue of $P_l D P_l$ each column came from
    pub weights: Array1<f64>,
}

impl LayerBasis {
    /// Builds the basis from the selected states.
    ///
    /// Every eigenvector of $P_l D P_l$ with weight above `min_layer_weight`
    /// joins the basis, largest weight first, and layers are concatenated in
    /// order. Each layer must carry at least `window.len() / num_layers` such
    /// vectors and the total must equal `window.len()`, otherwise the layer
    /// vectors do not span the window.
    pub fn build(
        window: &ValenceWindow,
        projector: &LayerProjector,
        config: &KpConfig,
    ) -> Result<LayerBasis> {
        let norb = window.states.nrows();
        if projector.norb() != norb {
            return Err(KpError::LayerLayoutMismatch {
                expected: projector.norb(),
                found: norb,
            });
        }
        let expected = window.len();
        let per_layer = expected / projector.num_layers;
        let dm = density_matrix(&window.states);

        let mut columns: Vec<Array1<Complex64>> = Vec::with_capacity(expected);
        let mut layers = Vec::with_capacity(expected);
        let mut weights = Vec::with_capacity(expected);
        for l in 0..projector.num_layers {
            let (eval, evec) = eigh(&projector.project(l, &dm))?;
            // eigh is ascending, walk from the top
            let kept: Vec<usize> = (0..norb)
                .rev()
                .take_while(|&n| eval[n] > config.min_layer_weight)
                .collect();
            if kept.len() < per_layer {
                let weakest = norb.checked_sub(per_layer).map_or(0.0, |n| eval[n]);
                return Err(KpError::NegligibleLayerWeight {
                    layer: l,
                    weight: weakest,
                    threshold: config.min_layer_weight,
                });
            }
            for n in kept {
                columns.push(evec.column(n).to_owned());
                layers.push(l);
                weights.push(eval[n]);
            }
        }
        if columns.len() != expected {
            return Err(KpError::LayerBasisCount {
                expected,
                found: columns.len(),
            });
        }

        let mut vectors = Array2::<Complex64>::zeros((norb, expected));
        for (mut col, v) in vectors.axis_iter_mut(Axis(1)).zip(columns.iter()) {
            col.assign(v);
        }
        check_orthonormal(&vectors, config.orthonormality_tolerance)?;
        log::debug!(
            "layer basis: {} vectors, weights {:?}",
            expected,
            weights
        );
        Ok(LayerBasis {
            vectors,
            layers,
            weights: Array1::from_vec(weights),
        })
    }

    pub fn len(&self) -> usize {
        self.vectors.ncols()
    }
}
