//! Spectrum at Γ and the choice of the valence window.
use crate::error::{KpError, Result};
use crate::math::eigh;
use crate::model::TightBindingModel;
use ndarray::prelude::*;
use num_complex::Complex64;

/// $H(\Gamma)$ and its eigenpairs, the only Bloch Hamiltonian kept for the whole run.
#[derive(Debug, Clone)]
pub struct GammaSpectrum {
    pub ham: Array2<Complex64>,
    /// ascending
    pub eval: Array1<f64>,
    /// eigenvectors as columns
    pub evec: Array2<Complex64>,
}

impl GammaSpectrum {
    pub fn new(model: &TightBindingModel) -> Result<GammaSpectrum> {
        let ham = model.gen_ham(&Array1::<f64>::zeros(3))?;
        let (eval, evec) = eigh(&ham)?;
        Ok(GammaSpectrum { ham, eval, evec })
    }
}

/// Indices of the `count` states directly below `fermi`, ascending.
///
/// `eval` must be sorted ascending. States exactly at `fermi` are not below it.
pub fn top_valence_indices(eval: &Array1<f64>, fermi: f64, count: usize) -> Result<Vec<usize>> {
    let below = eval.iter().take_while(|&&e| e < fermi).count();
    if below < count {
        return Err(KpError::InsufficientValenceStates {
            fermi,
            required: count,
            found: below,
        });
    }
    Ok(((below - count)..below).collect())
}

/// The selected valence states at Γ.
#[derive(Debug, Clone)]
pub struct ValenceWindow {
    /// band indices in the full spectrum, ascending
    pub indices: Vec<usize>,
    pub energies: Array1<f64>,
    /// one column per selected state
    pub states: Array2<Complex64>,
}

impl ValenceWindow {
    pub fn select(spectrum: &GammaSpectrum, fermi: f64, count: usize) -> Result<ValenceWindow> {
        if count == 0 {
            return Err(KpError::InvalidConfig(
                "the valence window must contain at least one state".to_string(),
            ));
        }
        let indices = top_valence_indices(&spectrum.eval, fermi, count)?;
        let energies = spectrum.eval.select(Axis(0), &indices);
        let states = spectrum.evec.select(Axis(1), &indices);
        Ok(ValenceWindow {
            indices,
            energies,
            states,
        })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Representative energy of the window used in every energy denominator:
    /// the lowest selected state, not the band average.
    pub fn e_repr(&self) -> f64 {
        self.energies[0]
    }
}
