//! Synthetic tight-binding models shared by the unit tests.
use crate::hopping::HoppingOperator;
use crate::model::TightBindingModel;
use ndarray::prelude::*;
use num_complex::Complex64;
use std::collections::HashMap;

/// Collects hoppings $\bra{i\bm 0}H\ket{j\bm R}$ and fills in the $-\bm R$ partners.
pub struct Blocks {
    norb: usize,
    map: HashMap<[isize; 3], Array2<Complex64>>,
}

impl Blocks {
    pub fn new(norb: usize) -> Blocks {
        let mut map = HashMap::new();
        map.insert([0, 0, 0], Array2::zeros((norb, norb)));
        Blocks { norb, map }
    }

    pub fn onsite(&mut self, i: usize, e: f64) -> &mut Self {
        self.entry([0, 0, 0])[[i, i]] += Complex64::new(e, 0.0);
        self
    }

    #[allow(non_snake_case)]
    pub fn hop(&mut self, i: usize, j: usize, R: [isize; 3], t: Complex64) -> &mut Self {
        self.entry(R)[[i, j]] += t;
        self.entry([-R[0], -R[1], -R[2]])[[j, i]] += t.conj();
        self
    }

    fn entry(&mut self, R: [isize; 3]) -> &mut Array2<Complex64> {
        let norb = self.norb;
        self.map
            .entry(R)
            .or_insert_with(|| Array2::zeros((norb, norb)))
    }

    pub fn build(&self, lat: Array2<f64>) -> TightBindingModel {
        let hop = HoppingOperator::from_blocks(self.map.clone(), 1e-12).unwrap();
        TightBindingModel::new(lat, hop).unwrap()
    }
}

fn square_lattice() -> Array2<f64> {
    array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 20.0]]
}

fn c(re: f64) -> Complex64 {
    Complex64::new(re, 0.0)
}

/// Four orbitals on a triangular lattice with pseudo-random complex hoppings.
pub fn random_model() -> TightBindingModel {
    let mut seed: u64 = 12345;
    let mut next = move || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((seed >> 11) as f64 / (1u64 << 53) as f64) - 0.5
    };
    let norb = 4;
    let mut blocks = Blocks::new(norb);
    for i in 0..norb {
        blocks.onsite(i, 2.0 * next());
        for j in (i + 1)..norb {
            blocks.hop(i, j, [0, 0, 0], Complex64::new(next(), next()));
        }
    }
    for R in [[1, 0, 0], [0, 1, 0], [1, -1, 0], [0, 0, 1], [2, 1, 0]] {
        for i in 0..norb {
            for j in 0..norb {
                blocks.hop(i, j, R, Complex64::new(next(), next()) * 0.3);
            }
        }
    }
    let lat = array![
        [1.0, 0.0, 0.0],
        [-0.5, 3.0_f64.sqrt() / 2.0, 0.0],
        [0.0, 0.0, 6.0]
    ];
    blocks.build(lat)
}

/// Six orbitals, two per layer, on-site energies only.
pub const TOY_ONSITE: [f64; 6] = [-0.5, -0.9, -0.6, -1.0, -0.7, -1.1];

pub fn onsite_toy_model() -> TightBindingModel {
    let mut blocks = Blocks::new(6);
    for (i, e) in TOY_ONSITE.iter().enumerate() {
        blocks.onsite(i, *e);
    }
    blocks.build(square_lattice())
}

/// Three layers of `[a, b, r]` orbitals on a square lattice.
///
/// `a` and `b` form the valence bands around $-0.6$ and $-1.8$ at Γ, coupled
/// between neighbouring layers. The remote orbital `r` sits at `r_onsite` and
/// couples to `a` and `b` only through odd ($\sin k$) hoppings, so at Γ the
/// valence and remote subspaces decouple exactly.
pub fn layered_model(r_onsite: f64) -> TightBindingModel {
    let mut blocks = Blocks::new(9);
    let s_a = 0.3;
    let s_b = 0.2;
    for l in 0..3 {
        let (a, b, r) = (3 * l, 3 * l + 1, 3 * l + 2);
        let shift = 0.1 * l as f64;
        blocks.onsite(a, -1.0 - shift);
        blocks.onsite(b, -1.5 - shift);
        blocks.onsite(r, r_onsite);
        for R in [[1, 0, 0], [0, 1, 0]] {
            blocks.hop(a, a, R, c(0.1));
            blocks.hop(b, b, R, c(-0.05));
        }
        // 2 s sin(k_x) and 2 s sin(k_y)
        blocks.hop(a, r, [1, 0, 0], Complex64::new(0.0, -s_a));
        blocks.hop(a, r, [-1, 0, 0], Complex64::new(0.0, s_a));
        blocks.hop(a, r, [0, 1, 0], Complex64::new(0.0, -s_a));
        blocks.hop(a, r, [0, -1, 0], Complex64::new(0.0, s_a));
        blocks.hop(b, r, [0, 1, 0], Complex64::new(0.0, -s_b));
        blocks.hop(b, r, [0, -1, 0], Complex64::new(0.0, s_b));
        if l + 1 < 3 {
            blocks.hop(a, a + 3, [0, 0, 0], c(0.05));
            blocks.hop(b, b + 3, [0, 0, 0], c(0.03));
        }
    }
    blocks.build(square_lattice())
}

pub fn dispersive_model() -> TightBindingModel {
    layered_model(4.0)
}

/// Valence energies of the on-site model with three layers of `[a, b, r]`.
pub const FLAT_VALENCE: [f64; 6] = [-1.0, -1.2, -1.1, -1.3, -1.4, -1.5];

/// Like [`layered_model`] without any hopping; `r` sits at `r_onsite` in every layer.
pub fn flat_model(r_onsite: f64) -> TightBindingModel {
    let mut blocks = Blocks::new(9);
    for l in 0..3 {
        blocks.onsite(3 * l, FLAT_VALENCE[2 * l]);
        blocks.onsite(3 * l + 1, FLAT_VALENCE[2 * l + 1]);
        blocks.onsite(3 * l + 2, r_onsite);
    }
    blocks.build(square_lattice())
}

/// Three layers of `[a, b, r]` where every pair of orbitals is coupled at
/// $\bm R=0$ by $0.05+0.01(i+j)$, so every layer leaks into every valence state.
///
/// The valence orbitals sit at $-2.0$ to $-2.5$ and the remote ones at $3.0$;
/// the Gershgorin discs of the two groups stay on opposite sides of zero, so
/// exactly six states lie below $E_F=0$.
pub fn hybridized_model() -> TightBindingModel {
    let mut blocks = Blocks::new(9);
    for l in 0..3 {
        let shift = 0.1 * l as f64;
        blocks.onsite(3 * l, -2.0 - shift);
        blocks.onsite(3 * l + 1, -2.3 - shift);
        blocks.onsite(3 * l + 2, 3.0);
    }
    for i in 0..9 {
        for j in (i + 1)..9 {
            blocks.hop(i, j, [0, 0, 0], c(0.05 + 0.01 * (i + j) as f64));
        }
    }
    blocks.build(square_lattice())
}
