//! Matrix elements of the effective Hamiltonian at Γ.
//!
//! With $Z$ the layer basis and $C$ its complement:
//!
//! * $H_0=Z^\dagger H Z$, $p_c=Z^\dagger\partial_c H Z$, $m^{-1}_{c'c}=Z^\dagger\partial_{c'}\partial_c H Z$;
//! * the virtual states $\beta$ (columns of $C$) enter through the denominators
//!   $d_\beta=E_\text{repr}-E_\beta$ with $E_\beta=\text{Re}(C^\dagger HC)_{\beta\beta}$;
//! * $\delta H_0=\sum_\beta H_{z'\beta}H_{\beta z}/d_\beta$;
//! * $\delta m^{-1}_{c'c}=\sum_\beta[(p_{c'})_{z'\beta}(p_c)_{\beta z}+(p_c)_{z'\beta}(p_{c'})_{\beta z}]/d_\beta$.
//!
//! All derivatives are taken at Γ along the in-plane Cartesian directions.
use crate::band::{GammaSpectrum, ValenceWindow};
use crate::complement::ComplementBasis;
use crate::config::{DenominatorPolicy, KpConfig};
use crate::error::{KpError, Result};
use crate::layer::LayerBasis;
use crate::math::{dagger, sandwich};
use crate::model::{IN_PLANE, TightBindingModel};
use ndarray::prelude::*;
use num_complex::Complex64;

/// A small energy denominator accepted under [`DenominatorPolicy::Warn`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenominatorWarning {
    /// column of the complement basis
    pub index: usize,
    pub virtual_energy: f64,
    pub denominator: f64,
}

#[derive(Debug, Clone)]
pub struct PerturbationTerms {
    pub h0: Array2<Complex64>,
    pub h0_correction: Array2<Complex64>,
    /// `[c, z', z]`
    pub p: Array3<Complex64>,
    /// `[c', c, z', z]`
    pub mstar_inv: Array4<Complex64>,
    pub mstar_inv_correction: Array4<Complex64>,
    pub e_repr: f64,
    pub virtual_energies: Array1<f64>,
    pub warnings: Vec<DenominatorWarning>,
}

impl PerturbationTerms {
    #[allow(non_snake_case)]
    pub fn build(
        model: &TightBindingModel,
        spectrum: &GammaSpectrum,
        window: &ValenceWindow,
        basis: &LayerBasis,
        complement: &ComplementBasis,
        config: &KpConfig,
    ) -> Result<PerturbationTerms> {
        let Z = &basis.vectors;
        let C = &complement.vectors;
        let H = &spectrum.ham;
        let nb = basis.len();
        let gamma = Array1::<f64>::zeros(3);
        let dH = model.gen_dham(&gamma)?;
        let d2H = model.gen_d2ham(&gamma)?;

        let h0 = sandwich(Z, H, Z);
        let mut p = Array3::<Complex64>::zeros((IN_PLANE, nb, nb));
        for (c, mut p0) in p.outer_iter_mut().enumerate() {
            p0.assign(&sandwich(Z, &dH.slice(s![c, .., ..]), Z));
        }
        let mut mstar_inv = Array4::<Complex64>::zeros((IN_PLANE, IN_PLANE, nb, nb));
        for cp in 0..IN_PLANE {
            for c in 0..IN_PLANE {
                mstar_inv
                    .slice_mut(s![cp, c, .., ..])
                    .assign(&sandwich(Z, &d2H.slice(s![cp, c, .., ..]), Z));
            }
        }

        let e_repr = window.e_repr();
        let virtual_energies = sandwich(C, H, C).diag().mapv(|x| x.re);
        let mut warnings = Vec::new();
        let mut inv_d = Array1::<Complex64>::zeros(virtual_energies.len());
        for (index, (&e, inv)) in virtual_energies.iter().zip(inv_d.iter_mut()).enumerate() {
            let denominator = e_repr - e;
            if denominator.abs() < config.denominator_threshold {
                // a vanishing denominator has no finite term to keep
                if config.denominator_policy == DenominatorPolicy::Abort || denominator == 0.0 {
                    return Err(KpError::NearDegenerateDenominator {
                        index,
                        denominator,
                        threshold: config.denominator_threshold,
                    });
                }
                log::warn!(
                    "virtual state {} at {:.6} is {:.3e} from E_repr = {:.6}, keeping the term",
                    index,
                    e,
                    denominator,
                    e_repr
                );
                warnings.push(DenominatorWarning {
                    index,
                    virtual_energy: e,
                    denominator,
                });
            }
            *inv = Complex64::new(1.0 / denominator, 0.0);
        }

        // <z|H|β>/d_β times <β|H|z'>
        let h_zc = sandwich(Z, H, C);
        let h0_correction = (&h_zc * &inv_d).dot(&dagger(&h_zc));

        let p_zc: Vec<Array2<Complex64>> = (0..IN_PLANE)
            .map(|c| sandwich(Z, &dH.slice(s![c, .., ..]), C))
            .collect();
        let mut mstar_inv_correction = Array4::<Complex64>::zeros((IN_PLANE, IN_PLANE, nb, nb));
        for cp in 0..IN_PLANE {
            for c in 0..IN_PLANE {
                let a = (&p_zc[cp] * &inv_d).dot(&dagger(&p_zc[c]));
                let b = (&p_zc[c] * &inv_d).dot(&dagger(&p_zc[cp]));
                mstar_inv_correction
                    .slice_mut(s![cp, c, .., ..])
                    .assign(&(a + b));
            }
        }

        Ok(PerturbationTerms {
            h0,
            h0_correction,
            p,
            mstar_inv,
            mstar_inv_correction,
            e_repr,
            virtual_energies,
            warnings,
        })
    }

    pub fn nbasis(&self) -> usize {
        self.h0.nrows()
    }
}
