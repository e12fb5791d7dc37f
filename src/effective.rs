//! The effective Hamiltonian as a function of the momentum offset from Γ.
use crate::error::{KpError, Result};
use crate::math::{eigh, eigvalsh};
use crate::model::{IN_PLANE, TightBindingModel};
use crate::perturbation::PerturbationTerms;
use ndarray::prelude::*;
use ndarray::Data;
use num_complex::Complex64;
use rayon::prelude::*;

/// $$H_\text{eff}(\bm q)=H_0+\delta H_0+\sum_c q_c p_c+\frac12\sum_{c'c}q_{c'}q_c\left(m^{-1}+\delta m^{-1}\right)_{c'c}$$
#[derive(Debug, Clone)]
pub struct EffectiveHamiltonian {
    pub terms: PerturbationTerms,
    /// $H_0+\delta H_0$
    ham0: Array2<Complex64>,
    /// $m^{-1}+\delta m^{-1}$
    mass: Array4<Complex64>,
}

/// Exact tight-binding bands next to the effective ones along a set of `q`.
#[derive(Debug, Clone)]
pub struct BandComparison {
    /// `nk x n_basis`, eigenvalues of $H(\Gamma+\bm q)$ at the selected band indices
    pub exact: Array2<f64>,
    /// `nk x n_basis`, eigenvalues of $H_\text{eff}(\bm q)$
    pub effective: Array2<f64>,
    pub max_deviation: f64,
}

impl EffectiveHamiltonian {
    pub fn new(terms: PerturbationTerms) -> EffectiveHamiltonian {
        let ham0 = &terms.h0 + &terms.h0_correction;
        let mass = &terms.mstar_inv + &terms.mstar_inv_correction;
        EffectiveHamiltonian { terms, ham0, mass }
    }

    pub fn nbasis(&self) -> usize {
        self.ham0.nrows()
    }

    /// `q` is Cartesian with two or three components; a third one is ignored.
    pub fn gen_ham<S: Data<Elem = f64>>(&self, q: &ArrayBase<S, Ix1>) -> Result<Array2<Complex64>> {
        if q.len() != 2 && q.len() != 3 {
            return Err(KpError::DimensionMismatch {
                context: "momentum offset q".to_string(),
                expected: IN_PLANE,
                found: q.len(),
            });
        }
        let mut hamk = self.ham0.clone();
        for c in 0..IN_PLANE {
            hamk.scaled_add(Complex64::new(q[c], 0.0), &self.terms.p.slice(s![c, .., ..]));
        }
        for cp in 0..IN_PLANE {
            for c in 0..IN_PLANE {
                hamk.scaled_add(
                    Complex64::new(0.5 * q[cp] * q[c], 0.0),
                    &self.mass.slice(s![cp, c, .., ..]),
                );
            }
        }
        Ok(hamk)
    }

    pub fn solve_band_onek<S: Data<Elem = f64>>(&self, q: &ArrayBase<S, Ix1>) -> Result<Array1<f64>> {
        eigvalsh(&self.gen_ham(q)?)
    }

    pub fn solve_onek<S: Data<Elem = f64>>(
        &self,
        q: &ArrayBase<S, Ix1>,
    ) -> Result<(Array1<f64>, Array2<Complex64>)> {
        eigh(&self.gen_ham(q)?)
    }

    /// Bands for every row of `qvec`, in parallel, row order kept.
    pub fn solve_band_all_parallel<S: Data<Elem = f64> + Sync>(
        &self,
        qvec: &ArrayBase<S, Ix2>,
    ) -> Result<Array2<f64>> {
        let nk = qvec.nrows();
        let rows: Vec<Array1<f64>> = (0..nk)
            .into_par_iter()
            .map(|i| self.solve_band_onek(&qvec.row(i)))
            .collect::<Result<Vec<_>>>()?;
        let mut band = Array2::<f64>::zeros((nk, self.nbasis()));
        for (mut a, eval) in band.outer_iter_mut().zip(rows.iter()) {
            a.assign(eval);
        }
        Ok(band)
    }

    /// Diagonalizes the full model at $\Gamma+\bm q$ and keeps the bands in
    /// `indices`, next to the effective bands at $\bm q$.
    pub fn compare_bands<S: Data<Elem = f64> + Sync>(
        &self,
        model: &TightBindingModel,
        indices: &[usize],
        qvec: &ArrayBase<S, Ix2>,
    ) -> Result<BandComparison> {
        if indices.len() != self.nbasis() {
            return Err(KpError::DimensionMismatch {
                context: "band indices compared against the effective model".to_string(),
                expected: self.nbasis(),
                found: indices.len(),
            });
        }
        if qvec.ncols() != 2 && qvec.ncols() != 3 {
            return Err(KpError::DimensionMismatch {
                context: "columns of the momentum offsets q".to_string(),
                expected: IN_PLANE,
                found: qvec.ncols(),
            });
        }
        let nk = qvec.nrows();
        let mut kvec = Array2::<f64>::zeros((nk, 3));
        kvec.slice_mut(s![.., 0..IN_PLANE])
            .assign(&qvec.slice(s![.., 0..IN_PLANE]));
        let exact = model
            .solve_band_all_parallel(&kvec)?
            .select(Axis(1), indices);
        let effective = self.solve_band_all_parallel(qvec)?;
        let max_deviation = (&exact - &effective)
            .iter()
            .fold(0.0_f64, |acc, x| acc.max(x.abs()));
        Ok(BandComparison {
            exact,
            effective,
            max_deviation,
        })
    }
}
