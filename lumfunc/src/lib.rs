//! Galaxy luminosity functions for mock catalogue generation
//!
//! This crate models the galaxy luminosity function (LF) as a function of
//! absolute magnitude and redshift, converts cumulative number densities to
//! magnitude thresholds, and rescales the magnitudes of simulated galaxies so
//! that their abundance follows a target LF, optionally while moving them to
//! a different cosmology.
//!
//! - [`luminosity`]: Schechter, tabulated and blended LFs, and the BGS and
//!   Uchuu target LFs
//! - [`inverter`]: precomputed density to magnitude lookup
//! - [`rescale`]: abundance-matching magnitude rescaling
//! - [`cosmology`] and [`hod`]: the external models the LFs are tied to

pub mod algo;
pub mod cosmology;
pub mod hod;
pub mod inverter;
pub mod luminosity;
pub mod rescale;

pub use cosmology::{Cosmology, CosmologyPair, FlatLambdaCdm};
pub use hod::{HodProvider, HodTable};
pub use inverter::{DensityMagnitudeInverter, GridAxis, GridError, InverterGrid};
pub use luminosity::{
    lum_to_mag, mag_to_lum, BlendedLf, LuminosityFunction, SchechterLf, SchechterParams,
    TabulatedLf, TargetLuminosityFunction,
};
pub use rescale::{MagnitudeRescaler, RescaleConfig, RescaledMagnitudes};
