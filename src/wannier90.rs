//! Reader for the wannier90 `seedname_hr.dat` real-space Hamiltonian.
use crate::error::{KpError, Result};
use crate::hopping::HoppingOperator;
use ndarray::prelude::*;
use num_complex::Complex64;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

impl HoppingOperator {
    /// Reads the hopping blocks from a wannier90 `seedname_hr.dat` file.
    ///
    /// The layout is: one comment line, `num_wann`, `nrpts`, the `nrpts`
    /// Wigner-Seitz degeneracies (15 per line), then `nrpts * num_wann^2`
    /// lines `R1 R2 R3 m n Re Im` for $\bra{m\bm 0}H\ket{n\bm R}$. Every element
    /// is divided by the degeneracy of its $\bm R$.
    pub fn from_hr<P: AsRef<Path>>(path: P, hermiticity_tol: f64) -> Result<HoppingOperator> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut reads: Vec<String> = Vec::new();
        for line in reader.lines() {
            reads.push(line?);
        }
        Self::parse_hr(&reads, &path.display().to_string(), hermiticity_tol)
    }

    #[allow(non_snake_case)]
    pub(crate) fn parse_hr(reads: &[String], file: &str, hermiticity_tol: f64) -> Result<HoppingOperator> {
        let parse_err = |message: String| KpError::FileParse {
            file: file.to_string(),
            message,
        };
        let header_usize = |i: usize, what: &str| -> Result<usize> {
            reads
                .get(i)
                .ok_or_else(|| parse_err(format!("missing {}", what)))?
                .trim()
                .parse::<usize>()
                .map_err(|e| parse_err(format!("Failed to parse {}: {}", what, e)))
        };
        let nsta = header_usize(1, "num_wann")?;
        let n_R = header_usize(2, "nrpts")?;

        // Wigner-Seitz degeneracies, 15 per line
        let mut weights: Vec<usize> = Vec::with_capacity(n_R);
        let mut n_line = 3;
        while weights.len() < n_R {
            let line = reads
                .get(n_line)
                .ok_or_else(|| parse_err("Unexpected end of file in degeneracies".to_string()))?;
            for x in line.split_whitespace() {
                let w = x
                    .parse::<usize>()
                    .map_err(|e| parse_err(format!("Failed to parse weight: {}", e)))?;
                if w == 0 {
                    return Err(parse_err("zero Wigner-Seitz degeneracy".to_string()));
                }
                weights.push(w);
            }
            n_line += 1;
        }
        if weights.len() != n_R {
            return Err(parse_err(format!(
                "found {} degeneracies for {} R points",
                weights.len(),
                n_R
            )));
        }

        let data: Vec<&String> = reads[n_line.min(reads.len())..]
            .iter()
            .filter(|l| !l.trim().is_empty())
            .collect();
        let block_len = nsta * nsta;
        if data.len() < n_R * block_len {
            return Err(parse_err(format!(
                "expected {} matrix elements, found {}",
                n_R * block_len,
                data.len()
            )));
        }
        let mut blocks: HashMap<[isize; 3], Array2<Complex64>> = HashMap::with_capacity(n_R);
        for (idx, line) in data.iter().take(n_R * block_len).enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 7 {
                return Err(parse_err(format!("short matrix element line '{}'", line.trim())));
            }
            let mut R = [0isize; 3];
            for (r, x) in R.iter_mut().zip(fields.iter()) {
                *r = x
                    .parse::<isize>()
                    .map_err(|e| parse_err(format!("Failed to parse R vector: {}", e)))?;
            }
            let m = fields[3]
                .parse::<usize>()
                .map_err(|e| parse_err(format!("Failed to parse orbital index: {}", e)))?;
            let n = fields[4]
                .parse::<usize>()
                .map_err(|e| parse_err(format!("Failed to parse orbital index: {}", e)))?;
            if m == 0 || n == 0 || m > nsta || n > nsta {
                return Err(parse_err(format!(
                    "orbital index ({}, {}) outside 1..={}",
                    m, n, nsta
                )));
            }
            let re = fields[5]
                .parse::<f64>()
                .map_err(|e| parse_err(format!("Failed to parse Hamiltonian real part: {}", e)))?;
            let im = fields[6]
                .parse::<f64>()
                .map_err(|e| parse_err(format!("Failed to parse Hamiltonian imaginary part: {}", e)))?;
            if idx % block_len == 0 && blocks.contains_key(&R) {
                return Err(parse_err(format!("R={:?} listed twice", R)));
            }
            // each R occupies num_wann^2 consecutive lines
            let weight = weights[idx / block_len] as f64;
            let block = blocks
                .entry(R)
                .or_insert_with(|| Array2::zeros((nsta, nsta)));
            block[[m - 1, n - 1]] = Complex64::new(re, im) / weight;
        }
        if blocks.len() != n_R {
            return Err(parse_err(format!(
                "header announces {} R points, file lists {}",
                n_R,
                blocks.len()
            )));
        }
        HoppingOperator::from_blocks(blocks, hermiticity_tol)
    }
}
