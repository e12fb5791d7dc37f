//! Reads the two numbers the derivation needs from a pwscf `scf.out`: the
//! Fermi energy and the lattice vectors.
use crate::error::{KpError, Result};
use ndarray::Array2;
use std::path::Path;

/// Contents of `scf.out` needed downstream.
#[derive(Debug, Clone)]
pub struct ScfOutput {
    /// eV
    pub fermi: f64,
    /// Rows are lattice vectors in Bohr.
    pub lat: Array2<f64>,
}

impl ScfOutput {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ScfOutput> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let file = path.display().to_string();
        Ok(ScfOutput {
            fermi: fermi_from_scf(&text, &file)?,
            lat: lattice_from_scf(&text, &file)?,
        })
    }
}

fn parse_err(file: &str, message: &str) -> KpError {
    KpError::FileParse {
        file: file.to_string(),
        message: message.to_string(),
    }
}

/// Last Fermi energy printed, in eV. Falls back to the highest occupied
/// level for fixed-occupation runs.
pub fn fermi_from_scf(text: &str, file: &str) -> Result<f64> {
    let mut fermi = None;
    for line in text.lines() {
        if line.contains("the Fermi energy is") {
            fermi = line
                .split_whitespace()
                .find_map(|x| x.parse::<f64>().ok());
        } else if fermi.is_none() && line.contains("highest occupied") {
            fermi = line
                .rsplit(|c: char| c == ':' || c == '=')
                .next()
                .and_then(|x| x.split_whitespace().find_map(|x| x.parse::<f64>().ok()));
        }
    }
    fermi.ok_or_else(|| parse_err(file, "no Fermi energy found"))
}

/// Lattice vectors in Bohr, from `lattice parameter (alat)` and the
/// `a(i) = ( x y z )` rows given in units of alat.
pub fn lattice_from_scf(text: &str, file: &str) -> Result<Array2<f64>> {
    let mut alat = None;
    let mut lat = Array2::<f64>::zeros((3, 3));
    let mut found = [false; 3];
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("lattice parameter (alat)") {
            alat = trimmed
                .split('=')
                .nth(1)
                .and_then(|x| x.split_whitespace().next())
                .and_then(|x| x.parse::<f64>().ok());
        }
        for i in 0..3 {
            let tag = format!("a({}) = (", i + 1);
            if let Some(rest) = trimmed.strip_prefix(&tag) {
                let values: Vec<f64> = rest
                    .trim_end_matches(')')
                    .split_whitespace()
                    .filter_map(|x| x.parse::<f64>().ok())
                    .collect();
                if values.len() != 3 {
                    return Err(parse_err(file, &format!("malformed lattice vector line '{}'", trimmed)));
                }
                for (j, v) in values.iter().enumerate() {
                    lat[[i, j]] = *v;
                }
                found[i] = true;
            }
        }
    }
    let alat = alat.ok_or_else(|| parse_err(file, "no 'lattice parameter (alat)' line"))?;
    if !found.iter().all(|x| *x) {
        return Err(parse_err(file, "missing crystal axes a(1), a(2), a(3)"));
    }
    Ok(lat * alat)
}
