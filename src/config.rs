//! Run configuration.
//!
//! Everything that is a knob rather than physics input lives here: the layer
//! count and how orbitals are assigned to layers, and the numerical
//! tolerances of each stage. `validate` is called by the pipeline before any
//! matrix is built.

use crate::error::{KpError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The only layer count the layer decomposition is implemented for.
pub const SUPPORTED_LAYER_COUNT: usize = 3;
/// Two valence states of interest per layer.
pub const STATES_PER_LAYER: usize = 2;

/// How the orbitals of the Wannier basis are distributed over the layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerLayout {
    /// Layer `l` owns orbitals `l*n .. (l+1)*n`.
    Contiguous { orbitals_per_layer: usize },
    /// Orbital space is `[spin up | spin down]`, each half contiguous by layer
    /// with `orbitals_per_layer` orbitals per layer and spin.
    SpinBlocked { orbitals_per_layer: usize },
    /// Layer index of every orbital.
    Explicit { layer_of_orbital: Vec<usize> },
}

impl LayerLayout {
    /// Number of orbitals this layout describes for `num_layers` layers.
    pub fn norb(&self, num_layers: usize) -> usize {
        match self {
            LayerLayout::Contiguous { orbitals_per_layer } => orbitals_per_layer * num_layers,
            LayerLayout::SpinBlocked { orbitals_per_layer } => 2 * orbitals_per_layer * num_layers,
            LayerLayout::Explicit { layer_of_orbital } => layer_of_orbital.len(),
        }
    }

    /// Layer index of each orbital.
    pub fn layer_of_orbital(&self, num_layers: usize) -> Vec<usize> {
        match self {
            LayerLayout::Contiguous { orbitals_per_layer } => (0..num_layers)
                .flat_map(|l| std::iter::repeat(l).take(*orbitals_per_layer))
                .collect(),
            LayerLayout::SpinBlocked { orbitals_per_layer } => {
                let half: Vec<usize> = (0..num_layers)
                    .flat_map(|l| std::iter::repeat(l).take(*orbitals_per_layer))
                    .collect();
                half.iter().chain(half.iter()).copied().collect()
            }
            LayerLayout::Explicit { layer_of_orbital } => layer_of_orbital.clone(),
        }
    }
}

/// What to do with an energy denominator whose magnitude is below
/// `denominator_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenominatorPolicy {
    /// Return [`KpError::NearDegenerateDenominator`].
    Abort,
    /// Keep the term, log a warning and record it in the result.
    Warn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpConfig {
    pub num_layers: usize,
    pub layout: LayerLayout,
    /// Eigenvalues of the projected density matrix below this are treated as zero.
    pub min_layer_weight: f64,
    pub orthonormality_tolerance: f64,
    /// Bound on |<z|b>| between layer and complement vectors.
    pub overlap_tolerance: f64,
    /// Singular values below `rank_tolerance * s_max` count as zero in the null space.
    pub rank_tolerance: f64,
    /// Largest allowed anti-Hermitian residue in the hopping data.
    pub hermiticity_tolerance: f64,
    pub denominator_threshold: f64,
    pub denominator_policy: DenominatorPolicy,
}

impl Default for KpConfig {
    fn default() -> Self {
        KpConfig {
            num_layers: SUPPORTED_LAYER_COUNT,
            // d (5) + two chalcogen p (2x3) orbitals per layer, both spins
            layout: LayerLayout::Contiguous {
                orbitals_per_layer: 22,
            },
            min_layer_weight: 1e-6,
            orthonormality_tolerance: 1e-10,
            overlap_tolerance: 1e-12,
            rank_tolerance: 1e-10,
            hermiticity_tolerance: 1e-8,
            denominator_threshold: 1e-3,
            denominator_policy: DenominatorPolicy::Abort,
        }
    }
}

impl KpConfig {
    pub fn with_layout(layout: LayerLayout) -> Self {
        KpConfig {
            layout,
            ..KpConfig::default()
        }
    }

    /// Size of the valence window: two states per layer.
    pub fn num_selected(&self) -> usize {
        STATES_PER_LAYER * self.num_layers
    }

    /// Capability check run before any matrix work.
    pub fn validate(&self) -> Result<()> {
        if self.num_layers != SUPPORTED_LAYER_COUNT {
            return Err(KpError::UnsupportedLayerCount {
                found: self.num_layers,
                supported: SUPPORTED_LAYER_COUNT,
            });
        }
        if let LayerLayout::Explicit { layer_of_orbital } = &self.layout {
            if let Some(&l) = layer_of_orbital.iter().find(|&&l| l >= self.num_layers) {
                return Err(KpError::InvalidConfig(format!(
                    "orbital assigned to layer {} but only {} layers exist",
                    l, self.num_layers
                )));
            }
        }
        let tolerances = [
            ("min_layer_weight", self.min_layer_weight),
            ("orthonormality_tolerance", self.orthonormality_tolerance),
            ("overlap_tolerance", self.overlap_tolerance),
            ("rank_tolerance", self.rank_tolerance),
            ("hermiticity_tolerance", self.hermiticity_tolerance),
            ("denominator_threshold", self.denominator_threshold),
        ];
        for (name, value) in tolerances {
            if !(value.is_finite() && value >= 0.0) {
                return Err(KpError::InvalidConfig(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Checks the layout against the orbital count of a loaded model.
    pub fn check_norb(&self, norb: usize) -> Result<()> {
        let expected = self.layout.norb(self.num_layers);
        if expected != norb {
            return Err(KpError::LayerLayoutMismatch {
                expected,
                found: norb,
            });
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> Result<KpConfig> {
        serde_json::from_str(s).map_err(|e| KpError::InvalidConfig(e.to_string()))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<KpConfig> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| KpError::FileParse {
            file: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
