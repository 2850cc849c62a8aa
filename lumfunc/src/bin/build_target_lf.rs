//! Target luminosity function table builder
//!
//! Builds the z = 0.1 BGS target LF from an HOD prediction and the SDSS
//! cumulative LF, and writes it as a `(magnitude, log10 n)` table. An
//! existing table is reused unless `--force` is given.
//!
//! Set `RUST_LOG=info` to follow the build.

use std::path::PathBuf;

use clap::Parser;
use lumfunc::hod::HodTable;
use lumfunc::luminosity::table_io::read_schechter_params;
use lumfunc::luminosity::{
    build_target_lf, load_or_build_target_lf, LuminosityFunction, TargetBuilderConfig,
    REFERENCE_REDSHIFT,
};

#[derive(Parser, Debug)]
#[command(
    name = "Target LF Builder",
    about = "Builds the tabulated z = 0.1 target luminosity function from an HOD",
    long_about = None
)]
struct Args {
    /// Output target LF table
    #[arg(long)]
    target_lf: PathBuf,

    /// SDSS cumulative LF table at z = 0.1
    #[arg(long)]
    sdss_lf: PathBuf,

    /// Schechter parameter file (three header rows, then Phi_star, M_star, alpha, P, Q)
    #[arg(long)]
    params: PathBuf,

    /// HOD cumulative density table at z = 0.1, as (magnitude, log10 n)
    #[arg(long)]
    hod_table: PathBuf,

    /// Rebuild the table even if it already exists
    #[arg(long)]
    force: bool,

    /// Magnitudes at which to print the resulting cumulative density
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = vec![-22.0, -21.0, -20.0, -19.0, -18.0]
    )]
    report: Vec<f64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let params = read_schechter_params(&args.params)?;
    let hod = HodTable::from_file(&args.hod_table)?;
    let config = TargetBuilderConfig::default();

    let lf = if args.force {
        build_target_lf(&args.target_lf, &args.sdss_lf, &params, &hod, &config)?
    } else {
        load_or_build_target_lf(&args.target_lf, &args.sdss_lf, &params, &hod, &config)?
    };

    let mags = lf.magnitudes();
    println!("Target LF: {}", args.target_lf.display());
    println!(
        "  {} rows, M = {:.4} to {:.4}",
        mags.len(),
        mags[0],
        mags[mags.len() - 1]
    );
    println!("  Evolution: P = {}, Q = {}", params.p, params.q);
    println!();
    println!("{:>10} {:>14} {:>14}", "M", "n(<M)", "phi(M)");
    for &mag in &args.report {
        println!(
            "{:>10.2} {:>14.6e} {:>14.6e}",
            mag,
            lf.phi_cumulative(mag, REFERENCE_REDSHIFT),
            lf.phi(mag, REFERENCE_REDSHIFT)
        );
    }

    Ok(())
}
