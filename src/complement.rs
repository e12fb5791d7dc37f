//! Orthogonal complement of the layer basis: the "virtual" states the
//! perturbative corrections sum over.
use crate::config::KpConfig;
use crate::error::{KpError, Result};
use crate::layer::LayerBasis;
use crate::math::{dagger, null_space};
use ndarray::prelude::*;
use ndarray::Data;
use num_complex::Complex64;

/// Fails with [`KpError::ComplementOverlap`] unless $|\braket{z|\beta}|$ is
/// below `tol` for every column $z$ of `basis` and $\beta$ of `complement`.
pub fn check_overlaps<A, B>(
    basis: &ArrayBase<A, Ix2>,
    complement: &ArrayBase<B, Ix2>,
    tol: f64,
) -> Result<()>
where
    A: Data<Elem = Complex64>,
    B: Data<Elem = Complex64>,
{
    let overlap = dagger(basis).dot(complement);
    if let Some(((b, z), x)) = overlap
        .indexed_iter()
        .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
    {
        if x.norm() >= tol {
            return Err(KpError::ComplementOverlap {
                basis: b,
                complement: z,
                overlap: x.norm(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ComplementBasis {
    /// one normalized vector per column, orthogonal to every layer basis vector
    pub vectors: Array2<Complex64>,
}

impl ComplementBasis {
    /// Null space of the matrix whose rows are $\bra{z}$ for the layer basis
    /// vectors, so that $\braket{z|\beta}=0$ for every returned $\ket\beta$.
    pub fn build(basis: &LayerBasis, config: &KpConfig) -> Result<ComplementBasis> {
        let norb = basis.vectors.nrows();
        let bras = dagger(&basis.vectors);
        let vectors = null_space(&bras, config.rank_tolerance)?;
        if basis.len() + vectors.ncols() != norb {
            return Err(KpError::ComplementDimension {
                basis: basis.len(),
                complement: vectors.ncols(),
                norb,
            });
        }
        check_overlaps(&basis.vectors, &vectors, config.overlap_tolerance)?;
        log::debug!("complement: {} virtual states", vectors.ncols());
        Ok(ComplementBasis { vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.ncols() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::{GammaSpectrum, ValenceWindow};
    use crate::config::LayerLayout;
    use crate::layer::LayerProjector;
    use crate::math::orthonormality_deviation;
    use crate::testing::{dispersive_model, onsite_toy_model};

    fn layer_basis(model: &crate::model::TightBindingModel, config: &KpConfig) -> LayerBasis {
        let spectrum = GammaSpectrum::new(model).unwrap();
        let window = ValenceWindow::select(&spectrum, 0.0, config.num_selected()).unwrap();
        LayerBasis::build(&window, &LayerProjector::new(config), config).unwrap()
    }

    #[test]
    fn full_basis_leaves_nothing() {
        let config = KpConfig::with_layout(LayerLayout::Contiguous {
            orbitals_per_layer: 2,
        });
        let basis = layer_basis(&onsite_toy_model(), &config);
        let complement = ComplementBasis::build(&basis, &config).unwrap();
        assert!(complement.is_empty());
        assert_eq!(complement.vectors.nrows(), 6);
    }

    #[test]
    fn remote_orbitals_form_the_complement() {
        let config = KpConfig::with_layout(LayerLayout::Contiguous {
            orbitals_per_layer: 3,
        });
        let basis = layer_basis(&dispersive_model(), &config);
        let complement = ComplementBasis::build(&basis, &config).unwrap();
        assert_eq!(basis.len() + complement.len(), 9);
        let (_, _, dev) = orthonormality_deviation(&complement.vectors);
        assert!(dev < 1e-10);
        let cross = dagger(&basis.vectors).dot(&complement.vectors);
        assert!(cross.iter().all(|x| x.norm() < 1e-12));
        // spanned by the r orbitals 2, 5, 8
        for col in complement.vectors.axis_iter(Axis(1)) {
            let on_r: f64 = [2, 5, 8].iter().map(|&i| col[i].norm_sqr()).sum();
            assert!((on_r - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn loose_rank_tolerance_breaks_the_dimension_check() {
        let config = KpConfig::with_layout(LayerLayout::Contiguous {
            orbitals_per_layer: 3,
        });
        let basis = layer_basis(&dispersive_model(), &config);
        // every singular value is 1, none exceeds 2 * s_max
        let loose = KpConfig {
            rank_tolerance: 2.0,
            ..config
        };
        let err = ComplementBasis::build(&basis, &loose).unwrap_err();
        assert!(matches!(
            err,
            KpError::ComplementDimension {
                basis: 6,
                complement: 9,
                norb: 9
            }
        ));
    }

    #[test]
    fn overlapping_complement_is_rejected() {
        let s = 1.0 / 2.0_f64.sqrt();
        let c = |x: f64| Complex64::new(x, 0.0);
        let basis = array![[c(1.0)], [c(0.0)], [c(0.0)]];
        let complement = array![[c(s), c(0.0)], [c(s), c(0.0)], [c(0.0), c(1.0)]];
        let err = check_overlaps(&basis, &complement, 1e-12).unwrap_err();
        match err {
            KpError::ComplementOverlap {
                basis,
                complement,
                overlap,
            } => {
                assert_eq!((basis, complement), (0, 0));
                assert!((overlap - s).abs() < 1e-12);
            }
            other => panic!("unexpected error {:?}", other),
        }
        check_overlaps(&basis, &complement.slice(s![.., 1..]), 1e-12).unwrap();
    }

    #[test]
    fn zero_overlap_tolerance_rejects_any_complement() {
        let config = KpConfig::with_layout(LayerLayout::Contiguous {
            orbitals_per_layer: 3,
        });
        let basis = layer_basis(&dispersive_model(), &config);
        // |<z|b>| < 0 can never hold
        let strict = KpConfig {
            overlap_tolerance: 0.0,
            ..config
        };
        let err = ComplementBasis::build(&basis, &strict).unwrap_err();
        assert!(matches!(err, KpError::ComplementOverlap { .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::Consistency);
    }
}
