//! Real-space hopping operator $\bra{m\bm 0}\hat H\ket{n\bm R}$.
//!
//! Only one member of every $\pm\bm R$ pair is stored, the other one is
//! $H(-\bm R)=H(\bm R)^\dagger$. The pairing is verified once, when the
//! operator is built, so that the Fourier sums in [`crate::model`] are
//! Hermitian by construction.
use crate::error::{KpError, Result};
use crate::math::{dagger, hermitian_residue};
use ndarray::prelude::*;
use num_complex::Complex64;
use std::collections::HashMap;

/// Real-space Hamiltonian blocks.
#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct HoppingOperator {
    /// Lattice displacements, one per row. Row 0 is $\bm R=0$, the others are
    /// the lexicographically positive member of each $\pm\bm R$ pair.
    pub hamR: Array2<isize>,
    /// `ham[i]` is the orbital block for `hamR.row(i)`.
    pub ham: Array3<Complex64>,
}

fn is_positive(R: &[isize; 3]) -> bool {
    R.iter().find(|&&x| x != 0).map_or(false, |&x| x > 0)
}

fn neg(R: &[isize; 3]) -> [isize; 3] {
    [-R[0], -R[1], -R[2]]
}

impl HoppingOperator {
    /// Builds the operator from `(R, H(R))` blocks covering both $\bm R$ and $-\bm R$.
    ///
    /// Fails with [`KpError::MalformedHopping`] for non-square or differently sized blocks,
    /// repeated displacements, a missing $-\bm R$ partner, or a partner that is not the
    /// conjugate transpose to within `hermiticity_tol`.
    #[allow(non_snake_case)]
    pub fn from_blocks<I>(blocks: I, hermiticity_tol: f64) -> Result<HoppingOperator>
    where
        I: IntoIterator<Item = ([isize; 3], Array2<Complex64>)>,
    {
        let mut norb: Option<usize> = None;
        let mut map: HashMap<[isize; 3], Array2<Complex64>> = HashMap::new();
        for (R, block) in blocks {
            let (rows, cols) = block.dim();
            if rows != cols {
                return Err(KpError::MalformedHopping(format!(
                    "block for R={:?} is {}x{}, not square",
                    R, rows, cols
                )));
            }
            match norb {
                None => norb = Some(rows),
                Some(n) if n != rows => {
                    return Err(KpError::MalformedHopping(format!(
                        "block for R={:?} has {} orbitals, expected {}",
                        R, rows, n
                    )));
                }
                _ => {}
            }
            if map.insert(R, block).is_some() {
                return Err(KpError::MalformedHopping(format!(
                    "displacement R={:?} appears more than once",
                    R
                )));
            }
        }
        let norb = norb.ok_or_else(|| KpError::MalformedHopping("no hopping blocks".to_string()))?;
        if norb == 0 {
            return Err(KpError::MalformedHopping("blocks have zero orbitals".to_string()));
        }

        let onsite = map
            .get(&[0, 0, 0])
            .cloned()
            .unwrap_or_else(|| Array2::zeros((norb, norb)));
        let residue = hermitian_residue(&onsite);
        if residue > hermiticity_tol {
            return Err(KpError::MalformedHopping(format!(
                "on-site block is not Hermitian, residue {:e}",
                residue
            )));
        }
        let onsite = (&onsite + &dagger(&onsite)) * Complex64::new(0.5, 0.0);

        let mut positive = Vec::new();
        for R in map.keys() {
            if *R == [0, 0, 0] {
                continue;
            }
            let partner = map.get(&neg(R)).ok_or_else(|| {
                KpError::MalformedHopping(format!(
                    "hopping for R={:?} exists, but its Hermitian conjugate for -R does not",
                    R
                ))
            })?;
            if is_positive(R) {
                let residue = (partner - &dagger(&map[R]))
                    .iter()
                    .fold(0.0_f64, |acc, x| acc.max(x.norm()));
                if residue > hermiticity_tol {
                    return Err(KpError::MalformedHopping(format!(
                        "H(-R) differs from H(R)^dagger by {:e} for R={:?}",
                        residue, R
                    )));
                }
                positive.push(*R);
            }
        }
        positive.sort();

        let n_R = positive.len() + 1;
        let mut hamR = Array2::<isize>::zeros((n_R, 3));
        let mut ham = Array3::<Complex64>::zeros((n_R, norb, norb));
        ham.slice_mut(s![0, .., ..]).assign(&onsite);
        for (i, R) in positive.iter().enumerate() {
            hamR.row_mut(i + 1).assign(&arr1(R));
            ham.slice_mut(s![i + 1, .., ..]).assign(&map[R]);
        }
        Ok(HoppingOperator { hamR, ham })
    }

    #[inline(always)]
    pub fn norb(&self) -> usize {
        self.ham.len_of(Axis(1))
    }

    #[allow(non_snake_case)]
    #[inline(always)]
    pub fn nR(&self) -> usize {
        self.hamR.nrows()
    }

    /// The block $H(\bm R)$ for any stored or implied displacement.
    #[allow(non_snake_case)]
    pub fn block(&self, R: [isize; 3]) -> Option<Array2<Complex64>> {
        let target = if R == [0, 0, 0] || is_positive(&R) {
            R
        } else {
            neg(&R)
        };
        let i = self
            .hamR
            .outer_iter()
            .position(|row| row.iter().zip(target.iter()).all(|(a, b)| a == b))?;
        let h = self.ham.slice(s![i, .., ..]);
        if target == R {
            Some(h.to_owned())
        } else {
            Some(dagger(&h))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn block(entries: &[(usize, usize, Complex64)], n: usize) -> Array2<Complex64> {
        let mut h = Array2::zeros((n, n));
        for &(i, j, t) in entries {
            h[[i, j]] = t;
        }
        h
    }

    #[test]
    fn pairs_are_folded() {
        let t = Complex64::new(0.3, 0.1);
        let blocks = vec![
            ([0, 0, 0], block(&[(0, 0, Complex64::new(1.0, 0.0))], 2)),
            ([1, 0, 0], block(&[(0, 1, t)], 2)),
            ([-1, 0, 0], block(&[(1, 0, t.conj())], 2)),
        ];
        let hop = HoppingOperator::from_blocks(blocks, 1e-10).unwrap();
        assert_eq!(hop.nR(), 2);
        assert_eq!(hop.norb(), 2);
        assert_eq!(hop.hamR.row(1).to_vec(), vec![1, 0, 0]);
        assert_eq!(hop.block([-1, 0, 0]).unwrap()[[1, 0]], t.conj());
        assert!(hop.block([0, 2, 0]).is_none());
    }

    #[test]
    fn missing_partner_is_rejected() {
        let blocks = vec![
            ([0, 0, 0], Array2::zeros((2, 2))),
            ([0, 1, 0], block(&[(0, 1, Complex64::new(1.0, 0.0))], 2)),
        ];
        let err = HoppingOperator::from_blocks(blocks, 1e-10).unwrap_err();
        assert!(matches!(err, KpError::MalformedHopping(_)));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn non_conjugate_partner_is_rejected() {
        let t = Complex64::new(0.0, 1.0);
        let blocks = vec![
            ([1, 0, 0], block(&[(0, 1, t)], 2)),
            ([-1, 0, 0], block(&[(1, 0, t)], 2)),
        ];
        assert!(HoppingOperator::from_blocks(blocks, 1e-10).is_err());
    }

    #[test]
    fn shape_errors() {
        let blocks = vec![([0, 0, 0], Array2::zeros((2, 3)))];
        assert!(matches!(
            HoppingOperator::from_blocks(blocks, 1e-10),
            Err(KpError::MalformedHopping(_))
        ));
        let blocks = vec![
            ([0, 0, 0], Array2::zeros((2, 2))),
            ([1, 0, 0], Array2::zeros((3, 3))),
            ([-1, 0, 0], Array2::zeros((3, 3))),
        ];
        assert!(HoppingOperator::from_blocks(blocks, 1e-10).is_err());
        let blocks: Vec<([isize; 3], Array2<Complex64>)> = vec![
            ([0, 0, 0], Array2::zeros((2, 2))),
            ([0, 0, 0], Array2::zeros((2, 2))),
        ];
        assert!(HoppingOperator::from_blocks(blocks, 1e-10).is_err());
    }

    #[test]
    fn onsite_must_be_hermitian() {
        let blocks = vec![(
            [0, 0, 0],
            block(&[(0, 1, Complex64::new(1.0, 0.0))], 2),
        )];
        assert!(HoppingOperator::from_blocks(blocks, 1e-10).is_err());
    }
}
