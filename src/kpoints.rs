//! Reciprocal lattice and straight k-lines.
use crate::error::{KpError, Result};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_linalg::Inverse;
use std::f64::consts::PI;

/// Reciprocal lattice vectors as rows, $\bm b_i\cdot\bm a_j=2\pi\delta_{ij}$.
#[allow(non_snake_case)]
pub fn reciprocal_lattice<S: Data<Elem = f64>>(lat: &ArrayBase<S, Ix2>) -> Result<Array2<f64>> {
    let inv = lat.t().to_owned().inv()?;
    Ok(inv * (2.0 * PI))
}

/// Converts fractional reciprocal coordinates into Cartesian ones.
pub fn frac_to_cart<S, T>(k_frac: &ArrayBase<S, Ix1>, lat: &ArrayBase<T, Ix2>) -> Result<Array1<f64>>
where
    S: Data<Elem = f64>,
    T: Data<Elem = f64>,
{
    if k_frac.len() != lat.nrows() {
        return Err(KpError::DimensionMismatch {
            context: "fractional k-point".to_string(),
            expected: lat.nrows(),
            found: k_frac.len(),
        });
    }
    Ok(k_frac.dot(&reciprocal_lattice(lat)?))
}

/// `nk` evenly spaced points from `start` to `stop`, both included, one per row.
#[allow(non_snake_case)]
#[inline(always)]
pub fn k_line<S, T>(start: &ArrayBase<S, Ix1>, stop: &ArrayBase<T, Ix1>, nk: usize) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
    T: Data<Elem = f64>,
{
    if start.len() != stop.len() {
        return Err(KpError::DimensionMismatch {
            context: "k-line end points".to_string(),
            expected: start.len(),
            found: stop.len(),
        });
    }
    let dim = start.len();
    let mut kvec = Array2::<f64>::zeros((nk, dim));
    let delta = stop - start;
    for (i, mut k) in kvec.axis_iter_mut(Axis(0)).enumerate() {
        let frac = if nk > 1 {
            i as f64 / (nk - 1) as f64
        } else {
            0.0
        };
        k.assign(&(start + &(&delta * frac)));
    }
    Ok(kvec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_reciprocal_lattice() {
        let lat = array![
            [1.0, 0.0, 0.0],
            [-0.5, 3.0_f64.sqrt() / 2.0, 0.0],
            [0.0, 0.0, 10.0]
        ];
        let b = reciprocal_lattice(&lat).unwrap();
        let prod = lat.dot(&b.t());
        for i in 0..3 {
            for j in 0..3 {
                let target = if i == j { 2.0 * PI } else { 0.0 };
                assert!((prod[[i, j]] - target).abs() < 1e-12);
            }
        }
        // K = (1/3, 1/3, 0) has |K| = 4 pi / 3 for a unit triangular lattice
        let k = frac_to_cart(&array![1.0 / 3.0, 1.0 / 3.0, 0.0], &lat).unwrap();
        let norm = k.dot(&k).sqrt();
        assert!((norm - 4.0 * PI / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_k_line() {
        let kvec = k_line(&array![0.0, 0.0, 0.0], &array![0.3, 0.6, 0.0], 4).unwrap();
        assert_eq!(kvec.shape(), &[4, 3]);
        assert!((kvec[[1, 0]] - 0.1).abs() < 1e-15);
        assert!((kvec[[3, 1]] - 0.6).abs() < 1e-15);
        assert!(k_line(&array![0.0], &array![0.0, 1.0], 3).is_err());
    }
}
