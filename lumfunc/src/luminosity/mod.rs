//! Galaxy luminosity functions with redshift evolution
//!
//! A luminosity function (LF) gives the number density of galaxies per unit
//! absolute magnitude, as a function of magnitude and redshift. Every model
//! here exposes both the differential form `phi` and the cumulative form
//! `phi_cumulative` (density of galaxies brighter than a magnitude) through
//! the [`LuminosityFunction`] trait, which is what the inversion and
//! rescaling code consumes.
//!
//! Magnitudes are absolute magnitudes `M - 5 log h`, densities are in
//! h³ Mpc⁻³ and luminosities in L☉ h⁻².

pub mod blended;
pub mod builder;
pub mod schechter;
pub mod table_io;
pub mod tabulated;
pub mod target;

pub use blended::{BlendedLf, LogisticTransition};
pub use builder::{BuildError, TargetBuilderConfig, TargetTable, TargetTableBuilder};
pub use schechter::{SchechterError, SchechterLf, SchechterParams};
pub use table_io::TableError;
pub use tabulated::TabulatedLf;
pub use target::{build_target_lf, load_or_build_target_lf, TargetError, TargetLuminosityFunction};

use crate::algo::interp::arange;
use crate::algo::spline::{CubicSpline, SplineError};
use crate::cosmology::CosmologyPair;

/// Redshift at which the evolution corrections vanish
pub const REFERENCE_REDSHIFT: f64 = 0.1;

/// Absolute magnitude of the Sun in the reference band
pub const SOLAR_ABSOLUTE_MAGNITUDE: f64 = 4.76;

/// Magnitude step used to difference a cumulative LF into a differential one
const DIFFERENTIAL_STEP: f64 = 0.001;

/// Faint end of the differencing grid
const DIFFERENTIAL_FAINT_LIMIT: f64 = 0.0;

/// Bright end of the differencing grid
const DIFFERENTIAL_BRIGHT_LIMIT: f64 = -25.0;

/// Convert absolute magnitude to luminosity in L☉ h⁻²
pub fn mag_to_lum(magnitude: f64) -> f64 {
    10f64.powf((SOLAR_ABSOLUTE_MAGNITUDE - magnitude) / 2.5)
}

/// Convert luminosity in L☉ h⁻² to absolute magnitude
pub fn lum_to_mag(luminosity: f64) -> f64 {
    SOLAR_ABSOLUTE_MAGNITUDE - 2.5 * luminosity.log10()
}

/// Number density of galaxies as a function of magnitude and redshift.
///
/// Implementations must keep `phi_cumulative` monotone in magnitude at any
/// fixed redshift: it never grows as the threshold gets brighter (more
/// negative), so sampled over an ascending magnitude grid it is
/// non-decreasing. Every inversion routine relies on it.
pub trait LuminosityFunction {
    /// Differential LF in h³ Mpc⁻³ mag⁻¹
    fn phi(&self, magnitude: f64, redshift: f64) -> f64;

    /// Density of galaxies brighter than `magnitude`, in h³ Mpc⁻³
    fn phi_cumulative(&self, magnitude: f64, redshift: f64) -> f64;

    /// Cumulative LF over a magnitude grid at a single redshift
    fn phi_cumulative_curve(&self, magnitudes: &[f64], redshift: f64) -> Vec<f64> {
        magnitudes
            .iter()
            .map(|&m| self.phi_cumulative(m, redshift))
            .collect()
    }

    /// Differential LF for a magnitude given in the new cosmology of `cosmology`
    fn phi_rescaled(&self, magnitude: f64, redshift: f64, cosmology: &CosmologyPair) -> f64 {
        let magnitude_orig = magnitude + cosmology.magnitude_shift(redshift);
        self.phi(magnitude_orig, redshift) * cosmology.volume_ratio(redshift)
    }

    /// Cumulative LF for a magnitude given in the new cosmology of `cosmology`
    fn phi_cumulative_rescaled(
        &self,
        magnitude: f64,
        redshift: f64,
        cosmology: &CosmologyPair,
    ) -> f64 {
        let magnitude_orig = magnitude + cosmology.magnitude_shift(redshift);
        self.phi_cumulative(magnitude_orig, redshift) * cosmology.volume_ratio(redshift)
    }
}

impl<L: LuminosityFunction + ?Sized> LuminosityFunction for &L {
    fn phi(&self, magnitude: f64, redshift: f64) -> f64 {
        (**self).phi(magnitude, redshift)
    }

    fn phi_cumulative(&self, magnitude: f64, redshift: f64) -> f64 {
        (**self).phi_cumulative(magnitude, redshift)
    }
}

/// Power-law evolution of a luminosity function away from z = 0.1.
///
/// Magnitudes brighten by `q` per unit redshift and log densities grow by
/// `0.4 p` per unit redshift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evolution {
    /// Number density evolution parameter
    pub p: f64,
    /// Magnitude evolution parameter
    pub q: f64,
}

impl Evolution {
    pub fn new(p: f64, q: f64) -> Self {
        Self { p, q }
    }

    /// Magnitude at z = 0.1 equivalent to `magnitude` at `redshift`
    pub fn magnitude_at_reference(&self, magnitude: f64, redshift: f64) -> f64 {
        magnitude + self.q * (redshift - REFERENCE_REDSHIFT)
    }

    /// Change in log10 density between z = 0.1 and `redshift`
    pub fn log_density_shift(&self, redshift: f64) -> f64 {
        0.4 * self.p * (redshift - REFERENCE_REDSHIFT)
    }
}

/// Spline of log10 of the differential LF, derived from a cumulative LF.
///
/// The cumulative curve is sampled every 0.001 mag over [-25, 0], differenced,
/// and a cubic spline is passed through the log of the differences placed at
/// the bin centres.
pub(crate) fn log_differential_spline<F>(cumulative: F) -> Result<CubicSpline, SplineError>
where
    F: Fn(f64) -> f64,
{
    let mags = arange(
        DIFFERENTIAL_FAINT_LIMIT,
        DIFFERENTIAL_BRIGHT_LIMIT,
        -DIFFERENTIAL_STEP,
    );
    let cums: Vec<f64> = mags.iter().map(|&m| cumulative(m)).collect();

    // Walk from bright to faint so the knots come out ascending
    let (knots, log_phi): (Vec<f64>, Vec<f64>) = (1..mags.len())
        .rev()
        .map(|i| {
            let phi = (cums[i - 1] - cums[i]) / DIFFERENTIAL_STEP;
            (mags[i] + DIFFERENTIAL_STEP / 2.0, phi.log10())
        })
        .unzip();

    CubicSpline::new(knots, log_phi)
}
