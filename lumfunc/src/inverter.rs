//! Number density to magnitude threshold inversion
//!
//! A blended or tabulated luminosity function has no closed-form inverse, so
//! the magnitude threshold reached at a given cumulative density is
//! precomputed on a regular `(redshift, log10 n)` grid and looked up with
//! bilinear interpolation.

use log::{debug, info};
use ndarray::Array2;
use rayon::prelude::*;
use thiserror::Error;

use crate::algo::interp::{arange, bracket, invert_sorted, make_non_decreasing};
use crate::luminosity::LuminosityFunction;

/// Upper bound on the number of points a [`GridAxis`] may expand to
pub const MAX_GRID_POINTS: usize = 100_000_000;

/// Errors that can occur when expanding a [`GridAxis`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Grid axis '{axis}' has unusable step {step} for the range [{start}, {stop})")]
    InvalidStep {
        axis: &'static str,
        start: f64,
        stop: f64,
        step: f64,
    },

    #[error("Grid axis '{axis}' needs at least 2 points, got {points}")]
    TooSmall { axis: &'static str, points: usize },
}

/// Errors that can occur while building or querying an inverter
#[derive(Debug, Error)]
pub enum InverterError {
    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),

    #[error("Input arrays must have the same length (number densities {densities}, redshifts {redshifts})")]
    LengthMismatch { densities: usize, redshifts: usize },

    #[error("Grid shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Half-open regular axis `[start, stop)` with a fixed step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridAxis {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl GridAxis {
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    /// Grid points, `arange(start, stop, step)`
    pub fn points(&self) -> Vec<f64> {
        arange(self.start, self.stop, self.step)
    }

    /// Number of points, or `None` when the step is zero or non-finite, points
    /// away from `stop`, or would give more than [`MAX_GRID_POINTS`] points
    pub fn point_count(&self) -> Option<usize> {
        if !(self.start.is_finite() && self.stop.is_finite() && self.step.is_finite()) {
            return None;
        }
        if self.step == 0.0 || (self.stop - self.start) * self.step < 0.0 {
            return None;
        }
        let n = ((self.stop - self.start) / self.step).ceil();
        if n > MAX_GRID_POINTS as f64 {
            return None;
        }
        Some(n as usize)
    }

    /// Grid points of a usable axis with at least two points
    ///
    /// # Errors
    ///
    /// * `GridError::InvalidStep` - see [`point_count`](Self::point_count)
    /// * `GridError::TooSmall` - fewer than two points
    pub fn checked_points(&self, axis: &'static str) -> Result<Vec<f64>, GridError> {
        if self.point_count().is_none() {
            return Err(GridError::InvalidStep {
                axis,
                start: self.start,
                stop: self.stop,
                step: self.step,
            });
        }

        let points = self.points();
        if points.len() < 2 {
            return Err(GridError::TooSmall {
                axis,
                points: points.len(),
            });
        }
        Ok(points)
    }
}

/// Resolution of the inversion table
#[derive(Debug, Clone, PartialEq)]
pub struct InverterGrid {
    /// Redshift rows
    pub redshift: GridAxis,
    /// log10 number density columns
    pub log_density: GridAxis,
    /// Magnitude samples the cumulative LF is evaluated on for each row
    pub magnitude: GridAxis,
}

impl Default for InverterGrid {
    fn default() -> Self {
        Self {
            redshift: GridAxis::new(0.0, 1.0, 0.01),
            log_density: GridAxis::new(-12.0, -0.5, 0.01),
            magnitude: GridAxis::new(-25.0, 0.0, 0.001),
        }
    }
}

/// Precomputed map from `(redshift, log10 n)` to magnitude threshold
#[derive(Debug, Clone)]
pub struct DensityMagnitudeInverter {
    redshifts: Vec<f64>,
    log_densities: Vec<f64>,
    /// Magnitude at `[redshift index, log density index]`
    magnitudes: Array2<f64>,
}

impl DensityMagnitudeInverter {
    /// Tabulate the inverse of `lf`'s cumulative form.
    ///
    /// For every redshift row the cumulative LF is sampled over the magnitude
    /// axis, converted to log10 and searched for each log density column.
    /// Rows are independent and are computed in parallel.
    ///
    /// # Errors
    ///
    /// Returns `InverterError::Grid` if any axis has an unusable step or
    /// fewer than two points.
    pub fn build<L>(lf: &L, grid: &InverterGrid) -> Result<Self, InverterError>
    where
        L: LuminosityFunction + Sync + ?Sized,
    {
        let redshifts = grid.redshift.checked_points("redshift")?;
        let log_densities = grid.log_density.checked_points("log_density")?;
        let mags = grid.magnitude.checked_points("magnitude")?;

        info!(
            "Building magnitude inversion table: {} redshifts x {} densities from {} magnitude samples",
            redshifts.len(),
            log_densities.len(),
            mags.len()
        );

        let n_cols = log_densities.len();
        let mut flat = vec![0.0; redshifts.len() * n_cols];

        flat.par_chunks_mut(n_cols)
            .zip(redshifts.par_iter())
            .for_each(|(row, &z)| {
                let mut log_ns: Vec<f64> = lf
                    .phi_cumulative_curve(&mags, z)
                    .into_iter()
                    .map(f64::log10)
                    .collect();
                make_non_decreasing(&mut log_ns);

                for (cell, &target) in row.iter_mut().zip(&log_densities) {
                    *cell = invert_sorted(&log_ns, &mags, target);
                }
            });

        let magnitudes = Array2::from_shape_vec((redshifts.len(), n_cols), flat)?;
        debug!("Inversion table shape {:?}", magnitudes.dim());

        Ok(Self {
            redshifts,
            log_densities,
            magnitudes,
        })
    }

    /// Magnitude threshold at which the cumulative density is `number_density`
    pub fn magnitude(&self, number_density: f64, redshift: f64) -> f64 {
        self.magnitude_from_log_density(number_density.log10(), redshift)
    }

    /// Bilinear lookup in `(redshift, log10 n)`, extrapolated past the grid edges
    pub fn magnitude_from_log_density(&self, log_density: f64, redshift: f64) -> f64 {
        let (i0, i1, tz) = Self::segment(&self.redshifts, redshift);
        let (j0, j1, tn) = Self::segment(&self.log_densities, log_density);

        let q00 = self.magnitudes[[i0, j0]];
        let q01 = self.magnitudes[[i0, j1]];
        let q10 = self.magnitudes[[i1, j0]];
        let q11 = self.magnitudes[[i1, j1]];

        (1.0 - tz) * ((1.0 - tn) * q00 + tn * q01) + tz * ((1.0 - tn) * q10 + tn * q11)
    }

    /// Element-wise [`magnitude`](Self::magnitude) over paired slices
    pub fn magnitude_many(
        &self,
        number_densities: &[f64],
        redshifts: &[f64],
    ) -> Result<Vec<f64>, InverterError> {
        if number_densities.len() != redshifts.len() {
            return Err(InverterError::LengthMismatch {
                densities: number_densities.len(),
                redshifts: redshifts.len(),
            });
        }

        Ok(number_densities
            .iter()
            .zip(redshifts)
            .map(|(&n, &z)| self.magnitude(n, z))
            .collect())
    }

    /// Lower index, upper index and fractional position of `value` on `axis`.
    ///
    /// The fraction lies outside `[0, 1]` when extrapolating.
    fn segment(axis: &[f64], value: f64) -> (usize, usize, f64) {
        let hi = bracket(axis, value);
        let lo = hi - 1;
        let t = (value - axis[lo]) / (axis[hi] - axis[lo]);
        (lo, hi, t)
    }

    /// Redshift rows of the table
    pub fn redshifts(&self) -> &[f64] {
        &self.redshifts
    }

    /// log10 density columns of the table
    pub fn log_densities(&self) -> &[f64] {
        &self.log_densities
    }

    /// Tabulated magnitudes, indexed `[redshift, log density]`
    pub fn magnitudes(&self) -> &Array2<f64> {
        &self.magnitudes
    }
}
