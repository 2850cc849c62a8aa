//! Halo occupation distribution (HOD) providers
//!
//! The target luminosity function is anchored to the cumulative galaxy
//! number density predicted by an HOD model at z = 0.1. The HOD itself lives
//! outside this crate; [`HodProvider`] is the capability the target builder
//! needs from it.

use std::path::Path;

use thiserror::Error;

use crate::algo::interp::Interp1d;
use crate::luminosity::table_io::{read_two_column_table, TableError};
use crate::luminosity::REFERENCE_REDSHIFT;

/// Errors that can occur when querying an HOD provider
#[derive(Debug, Error)]
pub enum HodError {
    #[error("Input arrays must have the same length (magnitudes {magnitudes}, redshifts {redshifts}, slide factors {slide_factors})")]
    LengthMismatch {
        magnitudes: usize,
        redshifts: usize,
        slide_factors: usize,
    },

    #[error("Unsupported query at redshift {redshift} with slide factor {slide_factor}")]
    UnsupportedQuery { redshift: f64, slide_factor: f64 },

    #[error("HOD table error: {0}")]
    Table(#[from] TableError),
}

/// Source of cumulative galaxy number densities from an HOD model
pub trait HodProvider {
    /// Number density of galaxies brighter than each magnitude, in h³ Mpc⁻³.
    ///
    /// The three slices are evaluated element-wise and must have equal length.
    fn cumulative_density(
        &self,
        magnitudes: &[f64],
        redshifts: &[f64],
        slide_factors: &[f64],
    ) -> Result<Vec<f64>, HodError>;
}

/// Check the element-wise contract shared by all providers
pub fn check_lengths(
    magnitudes: &[f64],
    redshifts: &[f64],
    slide_factors: &[f64],
) -> Result<(), HodError> {
    if magnitudes.len() != redshifts.len() || magnitudes.len() != slide_factors.len() {
        return Err(HodError::LengthMismatch {
            magnitudes: magnitudes.len(),
            redshifts: redshifts.len(),
            slide_factors: slide_factors.len(),
        });
    }
    Ok(())
}

/// Tolerance when matching the redshift and slide factor a table was exported at
const QUERY_TOLERANCE: f64 = 1e-9;

/// HOD predictions exported to a `(magnitude, log10 n)` table.
///
/// A table covers a single redshift (z = 0.1) with unit slide factor, which is
/// exactly what the target builder asks for; other queries are rejected.
#[derive(Debug, Clone)]
pub struct HodTable {
    log_density: Interp1d,
}

impl HodTable {
    /// Build from magnitudes and log10 cumulative densities in either order
    pub fn from_table(
        mut magnitudes: Vec<f64>,
        mut log_densities: Vec<f64>,
    ) -> Result<Self, HodError> {
        if magnitudes.len() >= 2 && magnitudes[0] > magnitudes[magnitudes.len() - 1] {
            magnitudes.reverse();
            log_densities.reverse();
        }

        let log_density = Interp1d::new(magnitudes, log_densities).map_err(TableError::from)?;
        Ok(Self { log_density })
    }

    /// Load a two column table file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HodError> {
        let (magnitudes, log_densities) = read_two_column_table(path.as_ref())?;
        Self::from_table(magnitudes, log_densities)
    }
}

impl HodProvider for HodTable {
    fn cumulative_density(
        &self,
        magnitudes: &[f64],
        redshifts: &[f64],
        slide_factors: &[f64],
    ) -> Result<Vec<f64>, HodError> {
        check_lengths(magnitudes, redshifts, slide_factors)?;

        magnitudes
            .iter()
            .zip(redshifts)
            .zip(slide_factors)
            .map(|((&mag, &z), &f)| {
                if (z - REFERENCE_REDSHIFT).abs() > QUERY_TOLERANCE
                    || (f - 1.0).abs() > QUERY_TOLERANCE
                {
                    return Err(HodError::UnsupportedQuery {
                        redshift: z,
                        slide_factor: f,
                    });
                }
                Ok(10f64.powf(self.log_density.eval(mag)))
            })
            .collect()
    }
}
