//! Dense linear algebra used by every stage.
//!
//! The stages never index into matrices to build products or decompositions
//! themselves; they go through the helpers here, which in turn go through
//! `ndarray-linalg`.
use crate::error::{KpError, Result};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_linalg::{EigValsh, Eigh, SVD, UPLO};
use num_complex::Complex64;

/// Conjugate transpose.
#[inline(always)]
pub fn dagger<S>(a: &ArrayBase<S, Ix2>) -> Array2<Complex64>
where
    S: Data<Elem = Complex64>,
{
    a.t().mapv(|x| x.conj())
}

/// $L^\dagger M R$.
#[allow(non_snake_case)]
#[inline(always)]
pub fn sandwich<A, B, C>(
    L: &ArrayBase<A, Ix2>,
    M: &ArrayBase<B, Ix2>,
    R: &ArrayBase<C, Ix2>,
) -> Array2<Complex64>
where
    A: Data<Elem = Complex64>,
    B: Data<Elem = Complex64>,
    C: Data<Elem = Complex64>,
{
    dagger(L).dot(&M.dot(R))
}

/// Eigenvalues in ascending order with the eigenvectors as columns.
pub fn eigh<S>(a: &ArrayBase<S, Ix2>) -> Result<(Array1<f64>, Array2<Complex64>)>
where
    S: Data<Elem = Complex64>,
{
    let (eval, evec) = a.eigh(UPLO::Lower)?;
    Ok((eval, evec))
}

pub fn eigvalsh<S>(a: &ArrayBase<S, Ix2>) -> Result<Array1<f64>>
where
    S: Data<Elem = Complex64>,
{
    Ok(a.eigvalsh(UPLO::Lower)?)
}

/// Largest entry of $|A-A^\dagger|$.
pub fn hermitian_residue<S>(a: &ArrayBase<S, Ix2>) -> f64
where
    S: Data<Elem = Complex64>,
{
    (a - &dagger(a))
        .iter()
        .fold(0.0_f64, |acc, x| acc.max(x.norm()))
}

pub fn is_hermitian<S>(a: &ArrayBase<S, Ix2>, tol: f64) -> bool
where
    S: Data<Elem = Complex64>,
{
    a.is_square() && hermitian_residue(a) <= tol
}

/// $\sum_n \ket{v_n}\bra{v_n}$ for the columns $v_n$ of `states`.
pub fn density_matrix<S>(states: &ArrayBase<S, Ix2>) -> Array2<Complex64>
where
    S: Data<Elem = Complex64>,
{
    states.dot(&dagger(states))
}

/// Largest deviation of $V^\dagger V$ from the identity, with the offending
/// column pair.
pub fn orthonormality_deviation<S>(v: &ArrayBase<S, Ix2>) -> (usize, usize, f64)
where
    S: Data<Elem = Complex64>,
{
    let gram = dagger(v).dot(v);
    let mut worst = (0, 0, 0.0);
    for ((i, j), g) in gram.indexed_iter() {
        let target = if i == j { 1.0 } else { 0.0 };
        let dev = (g - Complex64::new(target, 0.0)).norm();
        if dev > worst.2 {
            worst = (i, j, dev);
        }
    }
    worst
}

/// Orthonormal basis of the null space of `a`, as columns.
///
/// The rank is the number of singular values above `rank_tol` times the
/// largest one, so noise in nearly rank-deficient input is absorbed into the
/// null space instead of inflating the rank.
pub fn null_space<S>(a: &ArrayBase<S, Ix2>, rank_tol: f64) -> Result<Array2<Complex64>>
where
    S: Data<Elem = Complex64>,
{
    let n = a.ncols();
    if a.nrows() == 0 {
        return Ok(Array2::eye(n));
    }
    let (_, s, vt) = a.svd(false, true)?;
    let vt = vt.ok_or_else(|| KpError::DimensionMismatch {
        context: "right singular vectors of the null-space SVD".to_string(),
        expected: n,
        found: 0,
    })?;
    let s_max = s.iter().fold(0.0_f64, |acc, &x| acc.max(x));
    let rank = s.iter().filter(|&&x| x > rank_tol * s_max).count();
    let mut basis = Array2::<Complex64>::zeros((n, n - rank));
    for (mut col, row) in basis
        .axis_iter_mut(Axis(1))
        .zip(vt.outer_iter().skip(rank))
    {
        let v = row.mapv(|x| x.conj());
        let norm = v.iter().map(|x| x.norm_sqr()).sum::<f64>().sqrt();
        col.assign(&(v / Complex64::new(norm, 0.0)));
    }
    Ok(basis)
}
