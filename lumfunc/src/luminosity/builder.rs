//! Construction of the tabulated z = 0.1 target luminosity function
//!
//! The target LF follows the HOD prediction at the bright end, hands over to
//! an observed tabulated LF around M = -19 and is continued as a power law
//! fainter than M = -17. The result is stored as a cumulative table, the
//! same layout [`TabulatedLf`] reads.

use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use super::blended::LogisticTransition;
use super::table_io::{write_two_column_table, TableError};
use super::tabulated::TabulatedLf;
use super::{LuminosityFunction, REFERENCE_REDSHIFT};
use crate::algo::fit::{fit_line, FitError};
use crate::algo::spline::{CubicSpline, SplineError};
use crate::hod::{HodError, HodProvider};
use crate::inverter::{GridAxis, GridError};

/// Errors that can occur while building a target table
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("HOD query failed: {0}")]
    Hod(#[from] HodError),

    #[error("HOD cumulative density does not grow between magnitudes {bright} and {faint}")]
    NonMonotoneHod { bright: f64, faint: f64 },

    #[error("Spline through HOD differential LF failed: {0}")]
    Spline(#[from] SplineError),

    #[error("Faint-end power-law fit failed: {0}")]
    Fit(#[from] FitError),

    #[error("Target table error: {0}")]
    Table(#[from] TableError),

    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),
}

/// Grids and transitions used to assemble the target table
#[derive(Debug, Clone, PartialEq)]
pub struct TargetBuilderConfig {
    /// Magnitudes at which the HOD is sampled, bright end last
    pub hod_magnitudes: GridAxis,
    /// Redshift of the HOD prediction
    pub hod_redshift: f64,
    /// HOD slide factor
    pub slide_factor: f64,
    /// Output grid, sampled from `start` toward the bright `stop` and then
    /// reversed into ascending order
    pub fine_magnitudes: GridAxis,
    /// Hand-over from the HOD (bright) to the observed LF (faint)
    pub observed_transition: LogisticTransition,
    /// Open magnitude window `(bright, faint)` of the faint-end power-law fit
    pub fit_window: (f64, f64),
    /// Hand-over from the blended LF (bright) to the power law (faint)
    pub power_law_transition: LogisticTransition,
}

impl Default for TargetBuilderConfig {
    fn default() -> Self {
        Self {
            hod_magnitudes: GridAxis::new(-16.0, -24.0, -0.1),
            hod_redshift: REFERENCE_REDSHIFT,
            slide_factor: 1.0,
            fine_magnitudes: GridAxis::new(-10.0, -25.0000001, -0.001),
            observed_transition: LogisticTransition::new(-19.0, 5.0),
            fit_window: (-19.5, -16.3),
            power_law_transition: LogisticTransition::new(-17.0, 5.0),
        }
    }
}

/// Cumulative target LF at z = 0.1
#[derive(Debug, Clone, PartialEq)]
pub struct TargetTable {
    /// Ascending magnitudes
    pub magnitudes: Vec<f64>,
    /// log10 cumulative density at each magnitude
    pub log_densities: Vec<f64>,
}

impl TargetTable {
    /// Persist in the two column text layout
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        write_two_column_table(path.as_ref(), &self.magnitudes, &self.log_densities)
    }

    /// Turn the table into an evolving tabulated LF
    pub fn into_lf(self, p: f64, q: f64) -> Result<TabulatedLf, TableError> {
        TabulatedLf::from_table(self.magnitudes, self.log_densities, p, q)
    }
}

/// Assembles a [`TargetTable`] from an HOD and an observed low-redshift LF
pub struct TargetTableBuilder<'a> {
    hod: &'a dyn HodProvider,
    observed: &'a TabulatedLf,
    config: TargetBuilderConfig,
}

impl<'a> TargetTableBuilder<'a> {
    pub fn new(hod: &'a dyn HodProvider, observed: &'a TabulatedLf) -> Self {
        Self {
            hod,
            observed,
            config: TargetBuilderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TargetBuilderConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the full construction.
    ///
    /// 1. Sample the HOD cumulative density and difference it into a
    ///    differential LF at the bin centres.
    /// 2. Spline `log10` of the differential LF onto the fine grid.
    /// 3. Blend toward the observed differential LF fainter than the first
    ///    transition.
    /// 4. Fit a line to `log10` of the blend inside the fit window and blend
    ///    toward it fainter than the second transition.
    /// 5. Integrate back into a cumulative density, placing each running sum
    ///    at the faint edge of its fine bin.
    ///
    /// # Errors
    ///
    /// Fails if a magnitude grid is unusable, if the HOD query fails or its
    /// cumulative density does not grow toward faint magnitudes, or if the
    /// spline, fit or final table cannot be built.
    pub fn build(&self) -> Result<TargetTable, BuildError> {
        let cfg = &self.config;
        info!("Calculating target luminosity function");

        let hod_mags = cfg.hod_magnitudes.checked_points("hod_magnitudes")?;
        let redshifts = vec![cfg.hod_redshift; hod_mags.len()];
        let slide_factors = vec![cfg.slide_factor; hod_mags.len()];
        let hod_ns = self
            .hod
            .cumulative_density(&hod_mags, &redshifts, &slide_factors)?;

        let hod_step = cfg.hod_magnitudes.step.abs();
        let (centres, log_phi) = differential_from_cumulative(&hod_mags, &hod_ns, hod_step)?;
        let hod_spline = CubicSpline::new(centres, log_phi)?;

        let mut mags = cfg.fine_magnitudes.checked_points("fine_magnitudes")?;
        mags.reverse();
        let fine_step = cfg.fine_magnitudes.step.abs();
        debug!(
            "Target grid: {} HOD samples, {} fine magnitudes from {} to {}",
            hod_mags.len(),
            mags.len(),
            mags[0],
            mags[mags.len() - 1]
        );

        let mut ns: Vec<f64> = mags
            .iter()
            .map(|&m| {
                let hod_phi = 10f64.powf(hod_spline.evaluate(m));
                let observed_phi = self.observed.phi(m, cfg.hod_redshift);
                let t = cfg.observed_transition.weight(m);
                hod_phi * t + observed_phi * (1.0 - t)
            })
            .collect();

        let (bright, faint) = cfg.fit_window;
        let (fit_mags, fit_log_ns): (Vec<f64>, Vec<f64>) = mags
            .iter()
            .zip(&ns)
            .filter(|&(&m, _)| m > bright && m < faint)
            .map(|(&m, &n)| (m, n.log10()))
            .unzip();
        let power_law = fit_line(&fit_mags, &fit_log_ns)?;
        debug!(
            "Faint-end power law: log10 phi = {:.4} M + {:.4}",
            power_law.slope, power_law.intercept
        );

        for (n, &m) in ns.iter_mut().zip(&mags) {
            let t = cfg.power_law_transition.weight(m);
            *n = *n * t + 10f64.powf(power_law.eval(m)) * (1.0 - t);
        }

        let mut running = 0.0;
        let log_densities = ns
            .iter()
            .map(|&n| {
                running += n * fine_step;
                running.log10()
            })
            .collect();
        let magnitudes = mags.iter().map(|m| m + fine_step / 2.0).collect();

        Ok(TargetTable {
            magnitudes,
            log_densities,
        })
    }
}

/// Differential LF in log10 at the centres of a descending cumulative grid.
///
/// Returns `(centres, log10 phi)` with ascending centres.
fn differential_from_cumulative(
    mags: &[f64],
    cumulative: &[f64],
    step: f64,
) -> Result<(Vec<f64>, Vec<f64>), BuildError> {
    let mut centres = Vec::with_capacity(mags.len().saturating_sub(1));
    let mut log_phi = Vec::with_capacity(mags.len().saturating_sub(1));

    for i in (1..mags.len()).rev() {
        let n = (cumulative[i - 1] - cumulative[i]) / step;
        if !(n > 0.0) {
            return Err(BuildError::NonMonotoneHod {
                bright: mags[i],
                faint: mags[i - 1],
            });
        }
        centres.push((mags[i] + mags[i - 1]) / 2.0);
        log_phi.push(n.log10());
    }

    Ok((centres, log_phi))
}
