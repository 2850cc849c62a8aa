//! Magnitude rescaling of simulated galaxies onto a target luminosity function
//!
//! Both algorithms are abundance matching: a galaxy keeps its cumulative
//! number density and is given the magnitude at which the target LF reaches
//! that density.
//!
//! - [`MagnitudeRescaler::rescale_to_target_box`] ranks a simulation box at a
//!   single redshift.
//! - [`MagnitudeRescaler::rescale_with_evolution`] moves galaxies from their
//!   original redshift to a new one, interpolating between redshift bin
//!   edges.
//!
//! With a [`CosmologyPair`] the target LF is first converted into the new
//! cosmology.

use log::{debug, warn};
use thiserror::Error;

use crate::algo::interp::{invert_sorted, make_non_decreasing};
use crate::cosmology::CosmologyPair;
use crate::inverter::{GridAxis, GridError};
use crate::luminosity::LuminosityFunction;

/// Errors that can occur while rescaling magnitudes
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RescaleError {
    #[error("Input arrays must have the same length (magnitudes {magnitudes}, original redshifts {original}, new redshifts {new})")]
    LengthMismatch {
        magnitudes: usize,
        original: usize,
        new: usize,
    },

    #[error("Box volume must be positive and finite, got {0}")]
    InvalidVolume(f64),

    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),
}

/// Grids used by the rescaling algorithms
#[derive(Debug, Clone, PartialEq)]
pub struct RescaleConfig {
    /// Magnitudes at which the target cumulative LF is sampled
    pub magnitudes: GridAxis,
    /// Redshift bin edges
    pub redshift_bins: GridAxis,
    /// Replacement for the first bin edge, keeping it away from z = 0
    pub first_edge: f64,
}

impl Default for RescaleConfig {
    fn default() -> Self {
        Self {
            magnitudes: GridAxis::new(-24.0, 0.0, 0.01),
            redshift_bins: GridAxis::new(0.0, 1.001, 0.05),
            first_edge: 1e-6,
        }
    }
}

impl RescaleConfig {
    fn magnitude_points(&self) -> Result<Vec<f64>, GridError> {
        self.magnitudes.checked_points("magnitudes")
    }

    fn bin_edges(&self) -> Result<Vec<f64>, GridError> {
        let mut edges = self.redshift_bins.checked_points("redshift_bins")?;
        edges[0] = self.first_edge;
        Ok(edges)
    }
}

/// Output of [`MagnitudeRescaler::rescale_with_evolution`]
#[derive(Debug, Clone, PartialEq)]
pub struct RescaledMagnitudes {
    /// New magnitude of every galaxy, 0 where the galaxy was not rescaled
    pub magnitudes: Vec<f64>,
    /// Galaxies whose new redshift fell outside every bin
    pub unfilled: usize,
}

/// Rescales galaxy magnitudes so their abundance follows a target LF
pub struct MagnitudeRescaler<'a, L: ?Sized> {
    lf: &'a L,
    cosmology: Option<CosmologyPair<'a>>,
    config: RescaleConfig,
}

impl<'a, L: LuminosityFunction + ?Sized> MagnitudeRescaler<'a, L> {
    pub fn new(lf: &'a L) -> Self {
        Self {
            lf,
            cosmology: None,
            config: RescaleConfig::default(),
        }
    }

    /// Rescale into the new cosmology of `cosmology` as well
    pub fn with_cosmology(mut self, cosmology: CosmologyPair<'a>) -> Self {
        self.cosmology = Some(cosmology);
        self
    }

    pub fn with_config(mut self, config: RescaleConfig) -> Self {
        self.config = config;
        self
    }

    fn cumulative(&self, magnitude: f64, redshift: f64) -> f64 {
        match &self.cosmology {
            Some(pair) => self.lf.phi_cumulative_rescaled(magnitude, redshift, pair),
            None => self.lf.phi_cumulative(magnitude, redshift),
        }
    }

    /// log10 cumulative LF over `mags`, forced non-decreasing for inversion
    fn log_cumulative_curve(&self, mags: &[f64], redshift: f64) -> Vec<f64> {
        let mut curve: Vec<f64> = mags
            .iter()
            .map(|&m| self.cumulative(m, redshift).log10())
            .collect();
        make_non_decreasing(&mut curve);
        curve
    }

    /// Rescale every galaxy of a box at a single redshift.
    ///
    /// The brightest galaxy gets number density `1 / volume`, the next
    /// `2 / volume` and so on; each is then given the magnitude where the
    /// target cumulative LF at `redshift` reaches that density. Equal input
    /// magnitudes keep their input order.
    ///
    /// # Arguments
    ///
    /// * `magnitudes` - Absolute magnitudes of the simulated galaxies
    /// * `redshift` - Redshift the target LF is evaluated at
    /// * `volume` - Box volume in h⁻³ Mpc³
    pub fn rescale_to_target_box(
        &self,
        magnitudes: &[f64],
        redshift: f64,
        volume: f64,
    ) -> Result<Vec<f64>, RescaleError> {
        if !(volume > 0.0 && volume.is_finite()) {
            return Err(RescaleError::InvalidVolume(volume));
        }
        let mags = self.config.magnitude_points()?;

        let mut order: Vec<usize> = (0..magnitudes.len()).collect();
        order.sort_by(|&a, &b| magnitudes[a].total_cmp(&magnitudes[b]));

        let curve = self.log_cumulative_curve(&mags, redshift);

        let mut rescaled = vec![0.0; magnitudes.len()];
        for (rank, &galaxy) in order.iter().enumerate() {
            let log_n = ((rank + 1) as f64 / volume).log10();
            rescaled[galaxy] = invert_sorted(&curve, &mags, log_n);
        }

        Ok(rescaled)
    }

    /// Rescale galaxies from their original redshift to a new redshift.
    ///
    /// Each galaxy's cumulative density is taken from the target LF at its
    /// original redshift. Galaxies are then grouped by new redshift into
    /// bins; within a bin the magnitudes matching that density at both bin
    /// edges are found and linearly interpolated to the galaxy's new
    /// redshift.
    ///
    /// Galaxies whose new redshift lies outside the binned range are left at
    /// magnitude 0 and counted in [`RescaledMagnitudes::unfilled`].
    pub fn rescale_with_evolution(
        &self,
        magnitudes: &[f64],
        original_redshifts: &[f64],
        new_redshifts: &[f64],
    ) -> Result<RescaledMagnitudes, RescaleError> {
        if magnitudes.len() != original_redshifts.len()
            || magnitudes.len() != new_redshifts.len()
        {
            return Err(RescaleError::LengthMismatch {
                magnitudes: magnitudes.len(),
                original: original_redshifts.len(),
                new: new_redshifts.len(),
            });
        }

        let mags = self.config.magnitude_points()?;
        let edges = self.config.bin_edges()?;

        let log_ns: Vec<f64> = magnitudes
            .iter()
            .zip(original_redshifts)
            .map(|(&m, &z)| self.cumulative(m, z).log10())
            .collect();

        // Galaxy indices per bin, edges[i] <= z < edges[i + 1]
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); edges.len() - 1];
        let mut unfilled = 0;
        for (galaxy, &z) in new_redshifts.iter().enumerate() {
            let above = edges.partition_point(|&e| e <= z);
            if above == 0 || above == edges.len() {
                unfilled += 1;
            } else {
                members[above - 1].push(galaxy);
            }
        }

        let mut rescaled = vec![0.0; magnitudes.len()];
        for (bin, galaxies) in members.iter().enumerate() {
            if galaxies.is_empty() {
                continue;
            }

            let (z_lo, z_hi) = (edges[bin], edges[bin + 1]);
            debug!(
                "Rescaling {} galaxies in redshift bin [{}, {})",
                galaxies.len(),
                z_lo,
                z_hi
            );

            let curve_lo = self.log_cumulative_curve(&mags, z_lo);
            let curve_hi = self.log_cumulative_curve(&mags, z_hi);

            for &galaxy in galaxies {
                let mag_lo = invert_sorted(&curve_lo, &mags, log_ns[galaxy]);
                let mag_hi = invert_sorted(&curve_hi, &mags, log_ns[galaxy]);
                let frac = (new_redshifts[galaxy] - z_lo) / (z_hi - z_lo);
                rescaled[galaxy] = mag_lo + frac * (mag_hi - mag_lo);
            }
        }

        if unfilled > 0 {
            warn!(
                "{} of {} galaxies have a new redshift outside [{}, {}) and were not rescaled",
                unfilled,
                magnitudes.len(),
                edges[0],
                edges[edges.len() - 1]
            );
        }

        Ok(RescaledMagnitudes {
            magnitudes: rescaled,
            unfilled,
        })
    }
}
