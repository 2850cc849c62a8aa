//! Cosmology providers and the cosmology rescaling transform
//!
//! Mock catalogues are often built in one cosmology and analysed in another.
//! Moving a luminosity function between the two keeps the number of objects
//! above a threshold fixed: magnitudes shift with the ratio of comoving
//! distances and densities scale with the ratio of comoving volume elements.
//!
//! Distances are in Mpc/h and Hubble rates in h km s⁻¹ Mpc⁻¹ throughout.

use thiserror::Error;

use crate::algo::interp::{arange, Interp1d, InterpError};
use crate::algo::trapezoid::{cumulative_trap_integrate, TrapezoidError};

/// Speed of light in km/s
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// Hubble constant in units of h km s⁻¹ Mpc⁻¹
pub const H0_PER_LITTLE_H: f64 = 100.0;

/// Upper redshift of the precomputed distance table
const DISTANCE_TABLE_MAX_Z: f64 = 3.0;

/// Redshift resolution of the precomputed distance table
const DISTANCE_TABLE_STEP: f64 = 0.001;

/// Errors that can occur when constructing a cosmology
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CosmologyError {
    #[error("Matter density must be in (0, 1], got {0}")]
    InvalidMatterDensity(f64),

    #[error("Distance integration failed: {0}")]
    Integration(#[from] TrapezoidError),

    #[error("Distance table error: {0}")]
    Table(#[from] InterpError),
}

/// Capability of a cosmological model needed for rescaling
pub trait Cosmology {
    /// Comoving distance to `redshift` in Mpc/h
    fn comoving_distance(&self, redshift: f64) -> f64;

    /// Hubble rate H(z) in h km s⁻¹ Mpc⁻¹
    fn hubble_rate(&self, redshift: f64) -> f64;
}

/// A pair of cosmologies defining a rescaling from `original` to `new`.
///
/// Magnitudes handed to the rescaled luminosity functions are in the new
/// cosmology; the luminosity function itself is defined in the original one.
#[derive(Clone, Copy)]
pub struct CosmologyPair<'a> {
    pub original: &'a dyn Cosmology,
    pub new: &'a dyn Cosmology,
}

impl<'a> CosmologyPair<'a> {
    pub fn new(original: &'a dyn Cosmology, new: &'a dyn Cosmology) -> Self {
        Self { original, new }
    }

    /// Offset to add to a new-cosmology magnitude to get the original-cosmology magnitude.
    ///
    /// `5 log10(r_new / r_orig)`, undefined at z = 0.
    pub fn magnitude_shift(&self, redshift: f64) -> f64 {
        let r_orig = self.original.comoving_distance(redshift);
        let r_new = self.new.comoving_distance(redshift);
        5.0 * (r_new / r_orig).log10()
    }

    /// Ratio of comoving volume elements, original over new.
    pub fn volume_ratio(&self, redshift: f64) -> f64 {
        volume_element(self.original, redshift) / volume_element(self.new, redshift)
    }
}

/// Comoving volume element up to constant factors: `r² / E(z)`
fn volume_element(cosmology: &dyn Cosmology, redshift: f64) -> f64 {
    let r = cosmology.comoving_distance(redshift);
    let efunc = cosmology.hubble_rate(redshift) / cosmology.hubble_rate(0.0);
    r * r / efunc
}

/// Spatially flat ΛCDM cosmology without radiation.
///
/// Comoving distances are integrated once on a fine redshift grid and
/// interpolated afterwards, so per-galaxy queries are cheap.
#[derive(Debug, Clone)]
pub struct FlatLambdaCdm {
    omega_matter: f64,
    distance: Interp1d,
}

impl FlatLambdaCdm {
    /// Create a flat ΛCDM cosmology with matter density `omega_matter`
    pub fn new(omega_matter: f64) -> Result<Self, CosmologyError> {
        if !(omega_matter > 0.0 && omega_matter <= 1.0) {
            return Err(CosmologyError::InvalidMatterDensity(omega_matter));
        }

        let hubble_distance = SPEED_OF_LIGHT_KM_S / H0_PER_LITTLE_H;
        let redshifts = arange(
            0.0,
            DISTANCE_TABLE_MAX_Z + DISTANCE_TABLE_STEP,
            DISTANCE_TABLE_STEP,
        );
        let integral =
            cumulative_trap_integrate(&redshifts, |z| 1.0 / Self::efunc(omega_matter, z))?;
        let distances = integral.iter().map(|i| hubble_distance * i).collect();

        Ok(Self {
            omega_matter,
            distance: Interp1d::new(redshifts, distances)?,
        })
    }

    /// Matter density parameter
    pub fn omega_matter(&self) -> f64 {
        self.omega_matter
    }

    fn efunc(omega_matter: f64, redshift: f64) -> f64 {
        let a_inv = 1.0 + redshift;
        (omega_matter * a_inv * a_inv * a_inv + 1.0 - omega_matter).sqrt()
    }
}

impl Cosmology for FlatLambdaCdm {
    fn comoving_distance(&self, redshift: f64) -> f64 {
        self.distance.eval(redshift)
    }

    fn hubble_rate(&self, redshift: f64) -> f64 {
        H0_PER_LITTLE_H * Self::efunc(self.omega_matter, redshift)
    }
}
