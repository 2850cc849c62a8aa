//! Luminosity function backed by a table of cumulative densities
//!
//! The table holds `log10 n(<M)` at z = 0.1 on a magnitude grid. Other
//! redshifts are reached through the power-law [`Evolution`], and queries
//! outside the table are extrapolated along the boundary segments.

use std::path::Path;

use super::table_io::{read_two_column_table, write_two_column_table, TableError};
use super::{log_differential_spline, Evolution, LuminosityFunction};
use crate::algo::interp::Interp1d;
use crate::algo::spline::CubicSpline;

/// Tabulated cumulative luminosity function with evolution.
///
/// The differential form is not stored in the table; it is recovered once at
/// construction by differencing the cumulative curve and fitting a spline.
#[derive(Debug, Clone)]
pub struct TabulatedLf {
    /// log10 cumulative density at z = 0.1, by ascending magnitude
    log_density: Interp1d,
    evolution: Evolution,
    /// log10 differential density at z = 0.1
    log_differential: CubicSpline,
}

impl TabulatedLf {
    /// Build from `(magnitude, log10 cumulative density)` columns at z = 0.1.
    ///
    /// Magnitudes may be given in ascending or descending order.
    ///
    /// # Errors
    ///
    /// Returns `TableError::MalformedTable` if the cumulative density does not
    /// strictly grow toward faint magnitudes or contains non-finite values,
    /// and `TableError::Interp` for too few, unsorted or non-finite magnitudes.
    pub fn from_table(
        mut magnitudes: Vec<f64>,
        mut log_densities: Vec<f64>,
        p: f64,
        q: f64,
    ) -> Result<Self, TableError> {
        if magnitudes.len() >= 2 && magnitudes[0] > magnitudes[magnitudes.len() - 1] {
            magnitudes.reverse();
            log_densities.reverse();
        }

        let log_density = Interp1d::new(magnitudes, log_densities)?;
        validate_cumulative(&log_density)?;

        let log_differential = log_differential_spline(|m| 10f64.powf(log_density.eval(m)))?;

        Ok(Self {
            log_density,
            evolution: Evolution::new(p, q),
            log_differential,
        })
    }

    /// Load a two column table file.
    pub fn from_file(path: impl AsRef<Path>, p: f64, q: f64) -> Result<Self, TableError> {
        let (magnitudes, log_densities) = read_two_column_table(path.as_ref())?;
        Self::from_table(magnitudes, log_densities, p, q)
    }

    /// Write the table back out in the same two column layout.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        write_two_column_table(path.as_ref(), self.magnitudes(), self.log_densities())
    }

    /// Tabulated magnitudes, ascending
    pub fn magnitudes(&self) -> &[f64] {
        self.log_density.xs()
    }

    /// Tabulated log10 cumulative densities at z = 0.1
    pub fn log_densities(&self) -> &[f64] {
        self.log_density.ys()
    }

    /// Evolution parameters
    pub fn evolution(&self) -> Evolution {
        self.evolution
    }
}

/// A cumulative LF must be finite and strictly increasing toward faint magnitudes.
fn validate_cumulative(table: &Interp1d) -> Result<(), TableError> {
    let ys = table.ys();
    if let Some(i) = ys.iter().position(|y| !y.is_finite()) {
        return Err(TableError::MalformedTable(format!(
            "non-finite log density {} at magnitude {}",
            ys[i],
            table.xs()[i]
        )));
    }

    if let Some(i) = (1..ys.len()).find(|&i| ys[i] <= ys[i - 1]) {
        return Err(TableError::MalformedTable(format!(
            "cumulative density does not increase between magnitudes {} and {}",
            table.xs()[i - 1],
            table.xs()[i]
        )));
    }

    Ok(())
}

impl LuminosityFunction for TabulatedLf {
    fn phi(&self, magnitude: f64, redshift: f64) -> f64 {
        let magnitude01 = self.evolution.magnitude_at_reference(magnitude, redshift);
        let log_lf01 = self.log_differential.evaluate(magnitude01);
        10f64.powf(log_lf01 + self.evolution.log_density_shift(redshift))
    }

    fn phi_cumulative(&self, magnitude: f64, redshift: f64) -> f64 {
        let magnitude01 = self.evolution.magnitude_at_reference(magnitude, redshift);
        let log_lf01 = self.log_density.eval(magnitude01);
        10f64.powf(log_lf01 + self.evolution.log_density_shift(redshift))
    }
}
