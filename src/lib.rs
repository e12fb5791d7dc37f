//! Effective valence $\bm k\cdot\bm p$ Hamiltonians at Γ for layered crystals.
//!
//! Starting from a Wannier tight-binding model $H(\bm R)$ the crate
//!
//! 1: selects the valence states directly below the Fermi level at Γ,
//!
//! 2: rotates them into a basis where every vector lives in one layer,
//!
//! 3: folds the remaining states back in to second order, giving
//! $$H_\text{eff}(\bm q)=H_0+\delta H_0+\sum_c q_c p_c+\frac12\sum_{c'c}q_{c'}q_c\left(m^{-1}+\delta m^{-1}\right)_{c'c}.$$
//!
//! The entry point is [`pipeline::derive_gamma_kp`].
#![allow(non_snake_case)]

#[cfg(any(feature = "intel-mkl-system", feature = "intel-mkl-static"))]
extern crate intel_mkl_src as _src;

#[cfg(any(feature = "openblas-system", feature = "openblas-static"))]
extern crate openblas_src as _src;

#[cfg(any(feature = "netlib-system", feature = "netlib-static"))]
extern crate netlib_src as _src;

pub mod band;
pub mod complement;
pub mod config;
pub mod effective;
pub mod error;
pub mod hopping;
pub mod io;
pub mod kpoints;
pub mod layer;
pub mod math;
pub mod model;
pub mod perturbation;
pub mod pipeline;
pub mod pwscf;
pub mod wannier90;

#[cfg(test)]
mod testing;

pub use crate::band::{GammaSpectrum, ValenceWindow};
pub use crate::complement::ComplementBasis;
pub use crate::config::{DenominatorPolicy, KpConfig, LayerLayout};
pub use crate::effective::{BandComparison, EffectiveHamiltonian};
pub use crate::error::{ErrorKind, KpError, Result};
pub use crate::hopping::HoppingOperator;
pub use crate::layer::{LayerBasis, LayerProjector};
pub use crate::model::TightBindingModel;
pub use crate::perturbation::{DenominatorWarning, PerturbationTerms};
pub use crate::pipeline::{GammaKp, derive_gamma_kp, load_wannier_model};
