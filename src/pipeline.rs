//! Runs the whole derivation: selection at Γ, layer basis, complement,
//! perturbative terms and the evaluator built from them.
use crate::band::{GammaSpectrum, ValenceWindow};
use crate::complement::ComplementBasis;
use crate::config::KpConfig;
use crate::effective::{BandComparison, EffectiveHamiltonian};
use crate::error::Result;
use crate::hopping::HoppingOperator;
use crate::layer::{LayerBasis, LayerProjector};
use crate::model::TightBindingModel;
use crate::perturbation::PerturbationTerms;
use crate::pwscf::ScfOutput;
use ndarray::{ArrayBase, Data, Ix2};
use std::path::Path;

/// Every stage output of one derivation.
#[derive(Debug, Clone)]
pub struct GammaKp {
    pub fermi: f64,
    pub spectrum: GammaSpectrum,
    pub window: ValenceWindow,
    pub layer_basis: LayerBasis,
    pub complement: ComplementBasis,
    pub effective: EffectiveHamiltonian,
}

impl GammaKp {
    pub fn terms(&self) -> &PerturbationTerms {
        &self.effective.terms
    }

    /// [`EffectiveHamiltonian::compare_bands`] on the selected band indices.
    pub fn compare_bands<S: Data<Elem = f64> + Sync>(
        &self,
        model: &TightBindingModel,
        qvec: &ArrayBase<S, Ix2>,
    ) -> Result<BandComparison> {
        self.effective
            .compare_bands(model, &self.window.indices, qvec)
    }
}

/// Loads `seedname_hr.dat` and the Fermi level and lattice from `scf.out`.
///
/// The configuration is validated first, so an unsupported setup fails
/// before any file is read.
pub fn load_wannier_model<P, Q>(
    hr_path: P,
    scf_path: Q,
    config: &KpConfig,
) -> Result<(TightBindingModel, f64)>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    config.validate()?;
    let scf = ScfOutput::from_file(scf_path)?;
    let hop = HoppingOperator::from_hr(hr_path, config.hermiticity_tolerance)?;
    config.check_norb(hop.norb())?;
    log::info!(
        "loaded {} orbitals with {} hopping vectors, E_F = {:.6}",
        hop.norb(),
        hop.nR(),
        scf.fermi
    );
    Ok((TightBindingModel::new(scf.lat, hop)?, scf.fermi))
}

/// Derives the effective valence Hamiltonian at Γ for `model` with the
/// valence window directly below `fermi`.
pub fn derive_gamma_kp(
    model: &TightBindingModel,
    fermi: f64,
    config: &KpConfig,
) -> Result<GammaKp> {
    config.validate()?;
    config.check_norb(model.norb())?;

    let spectrum = GammaSpectrum::new(model)?;
    let window = ValenceWindow::select(&spectrum, fermi, config.num_selected())?;
    log::debug!(
        "valence window: bands {:?}, energies {}",
        window.indices,
        window.energies
    );
    let projector = LayerProjector::new(config);
    let layer_basis = LayerBasis::build(&window, &projector, config)?;
    let complement = ComplementBasis::build(&layer_basis, config)?;
    let terms = PerturbationTerms::build(
        model,
        &spectrum,
        &window,
        &layer_basis,
        &complement,
        config,
    )?;
    log::info!(
        "effective model: {} states, {} virtual states, E_repr = {:.6}, {} denominator warnings",
        layer_basis.len(),
        complement.len(),
        terms.e_repr,
        terms.warnings.len()
    );
    Ok(GammaKp {
        fermi,
        spectrum,
        window,
        layer_basis,
        complement,
        effective: EffectiveHamiltonian::new(terms),
    })
}
