//! src/error.rs
//! Error types for the whole k·p derivation.
//!
//! Every stage returns [`Result`]. The variants fall into three families, see
//! [`ErrorKind`]: configuration problems detected before or while loading the
//! inputs, consistency violations between stages, and numerical instabilities
//! in the perturbative corrections. None of them are retried; all are
//! deterministic functions of the input.

use thiserror::Error;

/// Broad classification of a [`KpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad inputs: unsupported layer count, malformed hopping data, too few valence states.
    Configuration,
    /// Stage outputs disagree with each other: basis counts, orthogonality.
    Consistency,
    /// Energy denominator too close to zero.
    NumericalInstability,
    /// LAPACK reported a failure.
    Linalg,
}

/// The primary error type for all fallible operations in this library.
#[derive(Error, Debug)]
pub enum KpError {
    // --- I/O and Parsing Errors ---
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse data from file '{file}': {message}")]
    FileParse { file: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // --- Configuration Errors ---
    #[error("Unsupported configuration: {found} layers requested, only {supported} is implemented")]
    UnsupportedLayerCount { found: usize, supported: usize },

    #[error("Layer layout covers {expected} orbitals but the model has {found}")]
    LayerLayoutMismatch { expected: usize, found: usize },

    #[error("Malformed hopping data: {0}")]
    MalformedHopping(String),

    #[error("Only {found} states lie below the reference energy {fermi}, but {required} are required")]
    InsufficientValenceStates {
        fermi: f64,
        required: usize,
        found: usize,
    },

    // --- Consistency Errors ---
    #[error("Layer decomposition gave {found} basis vectors, expected {expected}")]
    LayerBasisCount { expected: usize, found: usize },

    #[error("Layer {layer} weight {weight:e} is below the threshold {threshold:e}")]
    NegligibleLayerWeight {
        layer: usize,
        weight: f64,
        threshold: f64,
    },

    #[error("Layer basis is not orthonormal: <{i}|{j}> deviates by {deviation:e}")]
    NonOrthonormalBasis { i: usize, j: usize, deviation: f64 },

    #[error("Layer basis ({basis}) plus complement ({complement}) does not span {norb} orbitals")]
    ComplementDimension {
        basis: usize,
        complement: usize,
        norb: usize,
    },

    #[error("Complement vector {complement} overlaps layer vector {basis}: |<z|b>| = {overlap:e}")]
    ComplementOverlap {
        basis: usize,
        complement: usize,
        overlap: f64,
    },

    #[error("Dimension mismatch for '{context}': expected {expected}, got {found}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    // --- Numerical Errors ---
    #[error("Energy denominator E_repr - E_virtual = {denominator:e} for virtual state {index} is below {threshold:e}")]
    NearDegenerateDenominator {
        index: usize,
        denominator: f64,
        threshold: f64,
    },

    #[error("Linear algebra operation failed")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),
}

impl KpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KpError::Io(_)
            | KpError::FileParse { .. }
            | KpError::InvalidConfig(_)
            | KpError::UnsupportedLayerCount { .. }
            | KpError::LayerLayoutMismatch { .. }
            | KpError::MalformedHopping(_)
            | KpError::InsufficientValenceStates { .. } => ErrorKind::Configuration,
            KpError::LayerBasisCount { .. }
            | KpError::NegligibleLayerWeight { .. }
            | KpError::NonOrthonormalBasis { .. }
            | KpError::ComplementDimension { .. }
            | KpError::ComplementOverlap { .. }
            | KpError::DimensionMismatch { .. } => ErrorKind::Consistency,
            KpError::NearDegenerateDenominator { .. } => ErrorKind::NumericalInstability,
            KpError::Linalg(_) => ErrorKind::Linalg,
        }
    }
}

/// A specialized `Result` type for this library's operations.
pub type Result<T> = std::result::Result<T, KpError>;
