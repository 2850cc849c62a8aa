//! End-to-end checks: build a BGS target LF from files, invert it and rescale
//! a synthetic galaxy sample onto it.

use std::fs;
use std::path::{Path, PathBuf};

use lumfunc::algo::arange;
use lumfunc::luminosity::table_io::write_two_column_table;
use lumfunc::{
    CosmologyPair, FlatLambdaCdm, GridAxis, HodTable, InverterGrid, LuminosityFunction,
    MagnitudeRescaler, SchechterLf, SchechterParams, TabulatedLf, TargetLuminosityFunction,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const SDSS: SchechterParams = SchechterParams {
    phi_star: 0.0147,
    m_star: -20.44,
    alpha: -1.05,
    p: 1.6,
    q: 0.8,
};

const GAMA: SchechterParams = SchechterParams {
    phi_star: 0.0094,
    m_star: -20.7,
    alpha: -1.23,
    p: 1.8,
    q: 0.7,
};

/// Reduced inversion grid, fine enough for 0.01 mag round trips on grid rows
fn test_grid() -> InverterGrid {
    InverterGrid {
        redshift: GridAxis::new(0.0, 1.0, 0.05),
        log_density: GridAxis::new(-9.0, -0.5, 0.01),
        magnitude: GridAxis::new(-25.0, 0.0, 0.005),
    }
}

struct Inputs {
    sdss_lf: PathBuf,
    params: PathBuf,
    hod_table: PathBuf,
}

/// SDSS cumulative table, GAMA parameter file and an HOD export that agrees
/// with the SDSS LF
fn write_inputs(dir: &Path) -> Inputs {
    let sdss = SchechterLf::new(SDSS).unwrap();
    let mags = arange(-24.5, -9.95, 0.05);
    let log_ns: Vec<f64> = mags
        .iter()
        .map(|&m| sdss.phi_cumulative(m, 0.1).log10())
        .collect();

    let sdss_lf = dir.join("sdss_cumulative_lf.dat");
    write_two_column_table(&sdss_lf, &mags, &log_ns).unwrap();

    let hod_table = dir.join("hod_cumulative.dat");
    write_two_column_table(&hod_table, &mags, &log_ns).unwrap();

    let params = dir.join("lf_params.csv");
    fs::write(
        &params,
        format!(
            "# GAMA luminosity function\n# evolving Schechter fit\nPhi_star,M_star,alpha,P,Q\n{},{},{},{},{}\n",
            GAMA.phi_star, GAMA.m_star, GAMA.alpha, GAMA.p, GAMA.q
        ),
    )
    .unwrap();

    Inputs {
        sdss_lf,
        params,
        hod_table,
    }
}

fn bgs_target(dir: &Path) -> TargetLuminosityFunction<TabulatedLf> {
    let inputs = write_inputs(dir);
    let hod = HodTable::from_file(&inputs.hod_table).unwrap();
    TargetLuminosityFunction::bgs(
        dir.join("target_lf.dat"),
        &inputs.sdss_lf,
        &inputs.params,
        &hod,
        &test_grid(),
    )
    .unwrap()
}

#[test]
fn test_bgs_target_round_trip() {
    init_logging();
    let dir = tempdir().unwrap();
    let target = bgs_target(dir.path());
    assert!(dir.path().join("target_lf.dat").exists());

    for (mag, z) in [(-21.5, 0.05), (-19.5, 0.05), (-21.0, 0.5), (-18.5, 0.8)] {
        let n = target.phi_cumulative(mag, z);
        let recovered = target.magnitude(n, z);
        assert!(
            (recovered - mag).abs() < 0.01,
            "M = {}, z = {}: recovered {}",
            mag,
            z,
            recovered
        );
    }
}

#[test]
fn test_box_rescaling_onto_bgs_target() {
    init_logging();
    let dir = tempdir().unwrap();
    let target = bgs_target(dir.path());

    let mut rng = StdRng::seed_from_u64(42);
    let sample: Vec<f64> = (0..30_000)
        .map(|_| rng.random_range(-23.0..-16.0))
        .collect();
    let volume = 1e6;

    let rescaled = MagnitudeRescaler::new(&target)
        .rescale_to_target_box(&sample, 0.3, volume)
        .unwrap();

    for threshold in [-21.5, -20.5, -19.5] {
        let count = rescaled.iter().filter(|&&m| m < threshold).count();
        let expected = target.phi_cumulative(threshold, 0.3) * volume;
        assert!(
            (count as f64 / expected - 1.0).abs() < 0.02,
            "M < {}: {} galaxies, expected {:.1}",
            threshold,
            count,
            expected
        );
    }
}

#[test]
fn test_evolution_rescaling_with_cosmology() {
    init_logging();
    let dir = tempdir().unwrap();
    let target = bgs_target(dir.path());
    let orig = FlatLambdaCdm::new(0.3089).unwrap();
    let new = FlatLambdaCdm::new(0.315).unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    let n = 2_000;
    let mut mags: Vec<f64> = (0..n).map(|_| rng.random_range(-23.0..-17.0)).collect();
    let mut z_orig: Vec<f64> = (0..n).map(|_| rng.random_range(0.3..0.9)).collect();
    let mut z_new: Vec<f64> = z_orig
        .iter()
        .map(|z| z + rng.random_range(-0.005..0.005))
        .collect();

    // One galaxy moved beyond the last redshift bin
    mags.push(-21.0);
    z_orig.push(0.5);
    z_new.push(1.5);

    let result = MagnitudeRescaler::new(&target)
        .with_cosmology(CosmologyPair::new(&orig, &new))
        .rescale_with_evolution(&mags, &z_orig, &z_new)
        .unwrap();

    assert_eq!(result.unfilled, 1);
    assert_eq!(result.magnitudes[n], 0.0);
    for (new_mag, old_mag) in result.magnitudes[..n].iter().zip(&mags) {
        assert!(new_mag.is_finite());
        // Small redshift and cosmology changes only nudge magnitudes
        assert!(
            (new_mag - old_mag).abs() < 0.1,
            "{} -> {}",
            old_mag,
            new_mag
        );
    }
}

#[test]
fn test_uchuu_target_pipeline() {
    init_logging();
    let target = TargetLuminosityFunction::uchuu(SDSS, GAMA, &test_grid()).unwrap();

    let zs = [0.05, 0.3, 0.6];
    let ns = [1e-3, 1e-3, 1e-3];
    let mags = target.magnitude_many(&ns, &zs).unwrap();

    // Density evolution makes a fixed density correspond to brighter galaxies
    // at higher redshift
    assert!(mags[1] < mags[0]);
    assert!(mags[2] < mags[1]);
    for (&m, &z) in mags.iter().zip(&zs) {
        assert!((target.phi_cumulative(m, z) / 1e-3 - 1.0).abs() < 0.01);
    }
}
