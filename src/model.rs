//! Bloch Hamiltonian $H(\bm k)$ of a tight-binding model and its in-plane
//! momentum derivatives.
use crate::error::{KpError, Result};
use crate::hopping::HoppingOperator;
use crate::math::{dagger, eigh, eigvalsh};
use ndarray::prelude::*;
use ndarray::Data;
use num_complex::Complex64;
use rayon::prelude::*;

/// Number of in-plane Cartesian momentum components the derivatives are taken along.
pub const IN_PLANE: usize = 2;

/// A tight-binding model: hopping blocks plus the lattice they live on.
#[derive(Debug, Clone)]
pub struct TightBindingModel {
    /// Lattice vectors, one per row, Cartesian.
    pub lat: Array2<f64>,
    pub hop: HoppingOperator,
    /// $\bm R\cdot$`lat` for every stored displacement.
    R_cart: Array2<f64>,
}

impl TightBindingModel {
    pub fn new(lat: Array2<f64>, hop: HoppingOperator) -> Result<TightBindingModel> {
        if lat.dim() != (3, 3) {
            return Err(KpError::DimensionMismatch {
                context: "lattice vectors".to_string(),
                expected: 3,
                found: lat.nrows(),
            });
        }
        let R_cart = hop.hamR.mapv(|x| x as f64).dot(&lat);
        Ok(TightBindingModel { lat, hop, R_cart })
    }

    #[inline(always)]
    pub fn norb(&self) -> usize {
        self.hop.norb()
    }

    /// Phases $e^{i\bm k\cdot\bm R}$ for every stored $\bm R$.
    ///
    /// `kvec` is Cartesian with three components, or two in-plane ones with $k_z=0$.
    #[inline(always)]
    fn phases<S: Data<Elem = f64>>(&self, kvec: &ArrayBase<S, Ix1>) -> Result<Array1<Complex64>> {
        let kdotR = match kvec.len() {
            3 => self.R_cart.dot(kvec),
            IN_PLANE => self.R_cart.slice(s![.., 0..IN_PLANE]).dot(kvec),
            n => {
                return Err(KpError::DimensionMismatch {
                    context: "Cartesian k-vector".to_string(),
                    expected: 3,
                    found: n,
                });
            }
        };
        Ok(kdotR.mapv(|x| Complex64::new(0.0, x).exp()))
    }

    /// Sums `weight(R) * H(R) e^{ikR}` over the stored $\bm R\neq0$ and adds the
    /// Hermitian conjugate. `weight` must be real for the result to be Hermitian.
    fn fourier_sum<S, F>(&self, kvec: &ArrayBase<S, Ix1>, weight: F) -> Result<Array2<Complex64>>
    where
        S: Data<Elem = f64>,
        F: Fn(ArrayView1<f64>) -> Complex64,
    {
        let norb = self.norb();
        let Us = self.phases(kvec)?;
        let hamk = self
            .hop
            .ham
            .outer_iter()
            .zip(Us.iter())
            .zip(self.R_cart.outer_iter())
            .skip(1)
            .fold(Array2::<Complex64>::zeros((norb, norb)), |acc, ((ham, us), r)| {
                acc + &ham * (*us * weight(r))
            });
        Ok(&hamk + &dagger(&hamk))
    }

    /// Bloch Hamiltonian
    /// $$H(\bm k)=\sum_{\bm R}H(\bm R)e^{i\bm k\cdot\bm R},$$
    /// with $\bm k$ Cartesian. Built as $H(0)+\sum_{\bm R>0}[H(\bm R)e^{i\bm k\cdot\bm R}+\text{h.c.}]$,
    /// so it is Hermitian for every $\bm k$.
    #[allow(non_snake_case)]
    pub fn gen_ham<S: Data<Elem = f64>>(&self, kvec: &ArrayBase<S, Ix1>) -> Result<Array2<Complex64>> {
        let ham0 = self.hop.ham.slice(s![0, .., ..]);
        let hamk = self.fourier_sum(kvec, |_| Complex64::new(1.0, 0.0))?;
        Ok(&ham0 + &hamk)
    }

    /// $\partial_c H(\bm k)$ for the in-plane components, shape `(2, norb, norb)`.
    /// Each term picks up a factor $iR_c$.
    pub fn gen_dham<S: Data<Elem = f64>>(&self, kvec: &ArrayBase<S, Ix1>) -> Result<Array3<Complex64>> {
        let norb = self.norb();
        let mut v = Array3::<Complex64>::zeros((IN_PLANE, norb, norb));
        for (c, mut v0) in v.outer_iter_mut().enumerate() {
            v0.assign(&self.fourier_sum(kvec, |r| Complex64::new(0.0, r[c]))?);
        }
        Ok(v)
    }

    /// $\partial_{c'}\partial_c H(\bm k)$, shape `(2, 2, norb, norb)`, indexed `[c', c]`.
    /// Each term picks up a factor $-R_{c'}R_c$.
    pub fn gen_d2ham<S: Data<Elem = f64>>(&self, kvec: &ArrayBase<S, Ix1>) -> Result<Array4<Complex64>> {
        let norb = self.norb();
        let mut m = Array4::<Complex64>::zeros((IN_PLANE, IN_PLANE, norb, norb));
        for cp in 0..IN_PLANE {
            for c in 0..IN_PLANE {
                m.slice_mut(s![cp, c, .., ..])
                    .assign(&self.fourier_sum(kvec, |r| Complex64::new(-r[cp] * r[c], 0.0))?);
            }
        }
        Ok(m)
    }

    pub fn solve_band_onek<S: Data<Elem = f64>>(&self, kvec: &ArrayBase<S, Ix1>) -> Result<Array1<f64>> {
        eigvalsh(&self.gen_ham(kvec)?)
    }

    /// Eigenvalues ascending, eigenvectors as columns.
    pub fn solve_onek<S: Data<Elem = f64>>(
        &self,
        kvec: &ArrayBase<S, Ix1>,
    ) -> Result<(Array1<f64>, Array2<Complex64>)> {
        eigh(&self.gen_ham(kvec)?)
    }

    /// Band energies for every row of `kvec`, computed in parallel; row order is kept.
    pub fn solve_band_all_parallel<S: Data<Elem = f64> + Sync>(
        &self,
        kvec: &ArrayBase<S, Ix2>,
    ) -> Result<Array2<f64>> {
        let nk = kvec.nrows();
        let rows: Vec<Array1<f64>> = (0..nk)
            .into_par_iter()
            .map(|i| self.solve_band_onek(&kvec.row(i)))
            .collect::<Result<Vec<_>>>()?;
        let mut band = Array2::<f64>::zeros((nk, self.norb()));
        for (mut a, eval) in band.outer_iter_mut().zip(rows.iter()) {
            a.assign(eval);
        }
        Ok(band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::is_hermitian;
    use crate::testing::{dispersive_model, random_model};

    #[test]
    fn bloch_hamiltonian_is_hermitian() {
        let model = random_model();
        for k in [
            array![0.0, 0.0, 0.0],
            array![0.3, -1.1, 0.2],
            array![2.7, 0.4, -0.9],
        ] {
            assert!(is_hermitian(&model.gen_ham(&k).unwrap(), 1e-10));
            let dham = model.gen_dham(&k).unwrap();
            let d2ham = model.gen_d2ham(&k).unwrap();
            for c in 0..IN_PLANE {
                assert!(is_hermitian(&dham.slice(s![c, .., ..]), 1e-10));
                for cp in 0..IN_PLANE {
                    assert!(is_hermitian(&d2ham.slice(s![cp, c, .., ..]), 1e-10));
                }
            }
        }
    }

    #[test]
    fn derivatives_match_finite_differences() {
        let model = random_model();
        let k = array![0.2, -0.3, 0.1];
        let h = 1e-5;
        let dham = model.gen_dham(&k).unwrap();
        let d2ham = model.gen_d2ham(&k).unwrap();
        for c in 0..IN_PLANE {
            let mut kp = k.clone();
            kp[c] += h;
            let mut km = k.clone();
            km[c] -= h;
            let fd = (model.gen_ham(&kp).unwrap() - model.gen_ham(&km).unwrap()) / Complex64::new(2.0 * h, 0.0);
            let diff = (&fd - &dham.slice(s![c, .., ..]))
                .iter()
                .fold(0.0_f64, |acc, x| acc.max(x.norm()));
            assert!(diff < 1e-6, "dH/dk_{} off by {}", c, diff);

            let fd2 = (model.gen_dham(&kp).unwrap() - model.gen_dham(&km).unwrap()) / Complex64::new(2.0 * h, 0.0);
            for cp in 0..IN_PLANE {
                let diff = (&fd2.slice(s![cp, .., ..]) - &d2ham.slice(s![cp, c, .., ..]))
                    .iter()
                    .fold(0.0_f64, |acc, x| acc.max(x.norm()));
                assert!(diff < 1e-6, "d2H/dk_{}dk_{} off by {}", cp, c, diff);
            }
        }
    }

    #[test]
    fn parallel_sweep_matches_single_k() {
        let model = dispersive_model();
        let k = array![0.4, 0.0, 0.0];
        let eval = model.solve_band_onek(&k).unwrap();
        assert_eq!(eval.len(), 9);
        for i in 1..eval.len() {
            assert!(eval[i] >= eval[i - 1]);
        }
        let ks = array![[0.0, 0.0, 0.0], [0.1, 0.0, 0.0], [0.4, 0.0, 0.0]];
        let bands = model.solve_band_all_parallel(&ks).unwrap();
        assert_eq!(bands.dim(), (3, 9));
        for (a, b) in bands.row(2).iter().zip(eval.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn in_plane_k_vectors() {
        let model = dispersive_model();
        let h2 = model.gen_ham(&array![0.3, -0.2]).unwrap();
        let h3 = model.gen_ham(&array![0.3, -0.2, 0.0]).unwrap();
        assert!((&h2 - &h3).iter().all(|x| x.norm() < 1e-14));
        for k in [array![0.3], array![0.1, 0.2, 0.3, 0.4]] {
            assert!(matches!(
                model.gen_ham(&k),
                Err(KpError::DimensionMismatch { expected: 3, .. })
            ));
            assert!(model.solve_band_onek(&k).is_err());
        }
    }

    #[test]
    fn lattice_shape_is_checked() {
        let model = random_model();
        assert!(TightBindingModel::new(Array2::eye(2), model.hop.clone()).is_err());
    }
}
