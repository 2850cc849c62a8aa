//! Target luminosity functions for mock catalogue rescaling
//!
//! A target LF follows a low-redshift LF below z ≈ 0.15 and an evolving
//! Schechter fit above it. Each target owns the inversion table built from
//! its own cumulative form, so number densities can be converted to
//! magnitude thresholds without rebuilding it.
//!
//! Two targets are provided:
//!
//! - **BGS**: tabulated z = 0.1 LF derived from an HOD (built on first use
//!   and cached on disk) hand over to the GAMA Schechter fit.
//! - **Uchuu**: SDSS Schechter fit hand over to the GAMA Schechter fit.

use std::path::Path;

use log::info;
use thiserror::Error;

use super::blended::BlendedLf;
use super::builder::{BuildError, TargetBuilderConfig, TargetTableBuilder};
use super::schechter::{SchechterError, SchechterLf, SchechterParams};
use super::table_io::{read_schechter_params, TableError};
use super::tabulated::TabulatedLf;
use super::LuminosityFunction;
use crate::hod::HodProvider;
use crate::inverter::{DensityMagnitudeInverter, InverterError, InverterGrid};

/// Errors that can occur while assembling a target LF
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Schechter parameter error: {0}")]
    Schechter(#[from] SchechterError),

    #[error("Target table build failed: {0}")]
    Build(#[from] BuildError),

    #[error("Inversion table error: {0}")]
    Inverter(#[from] InverterError),
}

/// Blended target LF with its own density to magnitude inversion table
#[derive(Debug, Clone)]
pub struct TargetLuminosityFunction<Lo> {
    blended: BlendedLf<Lo, SchechterLf>,
    inverter: DensityMagnitudeInverter,
}

impl<Lo: LuminosityFunction + Sync> TargetLuminosityFunction<Lo> {
    /// Blend `low` into `high` and build the full-resolution inversion table
    pub fn new(low: Lo, high: SchechterLf) -> Result<Self, TargetError> {
        Self::with_grid(low, high, &InverterGrid::default())
    }

    /// Same as [`new`](Self::new) with a custom inversion grid
    pub fn with_grid(low: Lo, high: SchechterLf, grid: &InverterGrid) -> Result<Self, TargetError> {
        let blended = BlendedLf::new(low, high);
        let inverter = DensityMagnitudeInverter::build(&blended, grid)?;
        Ok(Self { blended, inverter })
    }
}

impl<Lo> TargetLuminosityFunction<Lo> {
    /// Magnitude threshold at which the cumulative density reaches `number_density`
    pub fn magnitude(&self, number_density: f64, redshift: f64) -> f64 {
        self.inverter.magnitude(number_density, redshift)
    }

    pub fn magnitude_many(
        &self,
        number_densities: &[f64],
        redshifts: &[f64],
    ) -> Result<Vec<f64>, InverterError> {
        self.inverter.magnitude_many(number_densities, redshifts)
    }

    /// Weight of the low-redshift LF at `redshift`
    pub fn transition(&self, redshift: f64) -> f64 {
        self.blended.transition(redshift)
    }

    pub fn low(&self) -> &Lo {
        self.blended.low()
    }

    pub fn high(&self) -> &SchechterLf {
        self.blended.high()
    }

    pub fn inverter(&self) -> &DensityMagnitudeInverter {
        &self.inverter
    }
}

impl<Lo: LuminosityFunction> LuminosityFunction for TargetLuminosityFunction<Lo> {
    fn phi(&self, magnitude: f64, redshift: f64) -> f64 {
        self.blended.phi(magnitude, redshift)
    }

    fn phi_cumulative(&self, magnitude: f64, redshift: f64) -> f64 {
        self.blended.phi_cumulative(magnitude, redshift)
    }
}

impl TargetLuminosityFunction<TabulatedLf> {
    /// BGS target LF.
    ///
    /// # Arguments
    ///
    /// * `target_lf_file` - Cached z = 0.1 target table, built from the HOD
    ///   and written here if it does not exist yet
    /// * `sdss_lf_file` - Observed SDSS cumulative LF table at z = 0.1
    /// * `param_file` - GAMA Schechter parameters; its `P` and `Q` also
    ///   evolve the tabulated LF
    /// * `hod` - HOD used when the target table has to be built
    /// * `grid` - Inversion table resolution
    pub fn bgs(
        target_lf_file: impl AsRef<Path>,
        sdss_lf_file: impl AsRef<Path>,
        param_file: impl AsRef<Path>,
        hod: &dyn HodProvider,
        grid: &InverterGrid,
    ) -> Result<Self, TargetError> {
        let params = read_schechter_params(param_file.as_ref())?;
        let high = SchechterLf::new(params)?;
        let low = load_or_build_target_lf(
            target_lf_file.as_ref(),
            sdss_lf_file.as_ref(),
            &params,
            hod,
            &TargetBuilderConfig::default(),
        )?;
        Self::with_grid(low, high, grid)
    }
}

impl TargetLuminosityFunction<SchechterLf> {
    /// Uchuu target LF, blending an SDSS Schechter fit into a GAMA one
    pub fn uchuu(
        sdss: SchechterParams,
        gama: SchechterParams,
        grid: &InverterGrid,
    ) -> Result<Self, TargetError> {
        Self::with_grid(SchechterLf::new(sdss)?, SchechterLf::new(gama)?, grid)
    }
}

/// Load the cached target table, building and writing it if the file is missing.
///
/// Any failure other than a missing file is returned unchanged.
pub fn load_or_build_target_lf(
    target_lf_file: &Path,
    sdss_lf_file: &Path,
    params: &SchechterParams,
    hod: &dyn HodProvider,
    config: &TargetBuilderConfig,
) -> Result<TabulatedLf, TargetError> {
    match TabulatedLf::from_file(target_lf_file, params.p, params.q) {
        Ok(lf) => Ok(lf),
        Err(e) if e.is_not_found() => {
            info!(
                "Target LF table {} not found, building it",
                target_lf_file.display()
            );
            build_target_lf(target_lf_file, sdss_lf_file, params, hod, config)
        }
        Err(e) => Err(e.into()),
    }
}

/// Build the target table from the HOD and SDSS LF and write it to `target_lf_file`
pub fn build_target_lf(
    target_lf_file: &Path,
    sdss_lf_file: &Path,
    params: &SchechterParams,
    hod: &dyn HodProvider,
    config: &TargetBuilderConfig,
) -> Result<TabulatedLf, TargetError> {
    let observed = TabulatedLf::from_file(sdss_lf_file, params.p, params.q)?;
    let table = TargetTableBuilder::new(hod, &observed)
        .with_config(config.clone())
        .build()?;

    table.write(target_lf_file)?;
    info!(
        "Wrote target LF table with {} rows to {}",
        table.magnitudes.len(),
        target_lf_file.display()
    );

    Ok(table.into_lf(params.p, params.q)?)
}
