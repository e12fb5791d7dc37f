use Rustkp::io::{write_txt, write_txt_1};
use Rustkp::kpoints::{frac_to_cart, k_line};
use Rustkp::*;
use ndarray::{Array1, Array2, Axis, array, s};
use std::path::PathBuf;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        log::error!("{} ({:?})", err, err.kind());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    //! Usage: gamma_valence <seedname> <dir> [config.json]
    //! Reads dir/seedname_hr.dat and dir/scf.out and compares the tight-binding
    //! and effective bands over the first 30% of Γ-K.
    let args: Vec<String> = std::env::args().collect();
    let seedname = args.get(1).map(String::as_str).unwrap_or("wannier90");
    let dir = PathBuf::from(args.get(2).map(String::as_str).unwrap_or("./"));
    let config = match args.get(3) {
        Some(path) => KpConfig::from_json_file(path)?,
        None => KpConfig::default(),
    };

    let (model, fermi) = load_wannier_model(
        dir.join(format!("{}_hr.dat", seedname)),
        dir.join("scf.out"),
        &config,
    )?;
    let kp = derive_gamma_kp(&model, fermi, &config)?;
    for (n, e) in kp.window.indices.iter().zip(kp.window.energies.iter()) {
        log::info!("band {:4}  E = {:12.6} eV", n, e);
    }
    for w in kp.terms().warnings.iter() {
        log::warn!(
            "virtual state {} at {:.6} eV, denominator {:.3e}",
            w.index,
            w.virtual_energy,
            w.denominator
        );
    }

    let nk = 101;
    let k_point = frac_to_cart(&array![1.0 / 3.0, 1.0 / 3.0, 0.0], &model.lat)?;
    let qvec = k_line(&Array1::<f64>::zeros(3), &(k_point * 0.3), nk)?;
    let cmp = kp.compare_bands(&model, &qvec)?;
    log::info!("largest deviation from the tight-binding bands: {:.6} eV", cmp.max_deviation);

    let q_dist = qvec.map_axis(Axis(1), |q| q.dot(&q).sqrt());
    write_txt_1(&q_dist, dir.join("kp_qdist.dat"))?;
    let mut exact = Array2::<f64>::zeros((nk, cmp.exact.ncols() + 1));
    exact.column_mut(0).assign(&q_dist);
    exact.slice_mut(s![.., 1..]).assign(&cmp.exact);
    write_txt(&exact, dir.join("kp_tb_band.dat"))?;
    let mut effective = Array2::<f64>::zeros((nk, cmp.effective.ncols() + 1));
    effective.column_mut(0).assign(&q_dist);
    effective.slice_mut(s![.., 1..]).assign(&cmp.effective);
    write_txt(&effective, dir.join("kp_eff_band.dat"))?;
    Ok(())
}
