//! Evolving Schechter luminosity function
//!
//! The Schechter form has a power-law faint end with slope `alpha` and an
//! exponential cutoff brighter than the characteristic magnitude `M_star`.
//! With `t = 10^(0.4 (M* - M))`,
//!
//! ```text
//! Φ(M) = 0.4 ln10 Φ* t^(α+1) e^(-t)
//! ```
//!
//! and the cumulative density brighter than `M` is `Φ* Γ(α+1, t)`, which is
//! evaluated through the recurrence
//! `Γ(α+1, t) = (Γ(α+2, t) - t^(α+1) e^(-t)) / (α+1)` so that the incomplete
//! gamma function is only ever needed at a positive argument.
//!
//! Redshift evolution moves `M*` by `-Q (z - 0.1)` and scales `Φ*` by
//! `10^(0.4 P z)`.

use std::f64::consts::LN_10;

use statrs::function::gamma::{gamma, gamma_ur};
use thiserror::Error;

use super::{LuminosityFunction, REFERENCE_REDSHIFT};

/// Errors that can occur when constructing a Schechter function
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchechterError {
    #[error("Faint-end slope alpha = {0} is unsupported: need alpha > -2 and alpha != -1")]
    InvalidAlpha(f64),

    #[error("Non-finite Schechter parameter {0} = {1}")]
    NonFinite(&'static str, f64),
}

/// Fit parameters of an evolving Schechter function
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchechterParams {
    /// Normalisation in h³ Mpc⁻³
    pub phi_star: f64,
    /// Characteristic absolute magnitude at z = 0.1
    pub m_star: f64,
    /// Faint-end slope
    pub alpha: f64,
    /// Number density evolution parameter
    pub p: f64,
    /// Magnitude evolution parameter
    pub q: f64,
}

/// Schechter luminosity function with evolution
#[derive(Debug, Clone, PartialEq)]
pub struct SchechterLf {
    params: SchechterParams,
    /// Γ(α+2), fixed by the faint-end slope
    complete_gamma: f64,
}

impl SchechterLf {
    /// Create an evolving Schechter function.
    ///
    /// # Errors
    ///
    /// * `SchechterError::NonFinite` - a parameter is NaN or infinite
    /// * `SchechterError::InvalidAlpha` - the closed-form cumulative is
    ///   undefined for `alpha <= -2` and `alpha == -1`
    pub fn new(params: SchechterParams) -> Result<Self, SchechterError> {
        for (name, value) in [
            ("phi_star", params.phi_star),
            ("m_star", params.m_star),
            ("alpha", params.alpha),
            ("p", params.p),
            ("q", params.q),
        ] {
            if !value.is_finite() {
                return Err(SchechterError::NonFinite(name, value));
            }
        }

        if params.alpha <= -2.0 || params.alpha == -1.0 {
            return Err(SchechterError::InvalidAlpha(params.alpha));
        }

        Ok(Self {
            params,
            complete_gamma: gamma(params.alpha + 2.0),
        })
    }

    /// Fit parameters this function was built from
    pub fn params(&self) -> &SchechterParams {
        &self.params
    }

    /// `(M*, Φ*)` evolved to `redshift`
    fn evolved(&self, redshift: f64) -> (f64, f64) {
        let m_star = self.params.m_star - self.params.q * (redshift - REFERENCE_REDSHIFT);
        let phi_star = self.params.phi_star * 10f64.powf(0.4 * self.params.p * redshift);
        (m_star, phi_star)
    }

    /// `t^(α+1) e^(-t)` in log space, so huge `t` underflows cleanly to zero
    fn power_exp(&self, t: f64) -> f64 {
        if t == f64::INFINITY {
            return 0.0;
        }
        ((self.params.alpha + 1.0) * t.ln() - t).exp()
    }

    /// Γ(α+2, t), with the limits at t = 0 and t = ∞ taken explicitly
    fn upper_incomplete_gamma(&self, t: f64) -> f64 {
        if t <= 0.0 {
            self.complete_gamma
        } else if t == f64::INFINITY {
            0.0
        } else {
            gamma_ur(self.params.alpha + 2.0, t) * self.complete_gamma
        }
    }
}

impl LuminosityFunction for SchechterLf {
    fn phi(&self, magnitude: f64, redshift: f64) -> f64 {
        let (m_star, phi_star) = self.evolved(redshift);
        let t = 10f64.powf(0.4 * (m_star - magnitude));

        0.4 * LN_10 * phi_star * self.power_exp(t)
    }

    fn phi_cumulative(&self, magnitude: f64, redshift: f64) -> f64 {
        let (m_star, phi_star) = self.evolved(redshift);
        let t = 10f64.powf(0.4 * (m_star - magnitude));

        let upper = self.upper_incomplete_gamma(t);
        phi_star * (upper - self.power_exp(t)) / (self.params.alpha + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::interp::arange;
    use approx::assert_relative_eq;

    fn gama_params() -> SchechterParams {
        SchechterParams {
            phi_star: 0.01,
            m_star: -20.7,
            alpha: -1.23,
            p: 1.8,
            q: 0.7,
        }
    }

    #[test]
    fn test_phi_at_characteristic_magnitude() {
        // t = 1 at M = M*, and z = 0.1 leaves M* untouched
        let lf = SchechterLf::new(SchechterParams {
            p: 0.0,
            ..gama_params()
        })
        .unwrap();
        let expected = 0.4 * LN_10 * 0.01 * (-1.0_f64).exp();
        assert_relative_eq!(lf.phi(-20.7, 0.1), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_phi_density_evolution_is_referenced_to_zero_redshift() {
        let lf = SchechterLf::new(gama_params()).unwrap();
        let no_evolution = SchechterLf::new(SchechterParams {
            p: 0.0,
            ..gama_params()
        })
        .unwrap();

        let ratio = lf.phi(-20.7, 0.1) / no_evolution.phi(-20.7, 0.1);
        assert_relative_eq!(ratio, 10f64.powf(0.072), max_relative = 1e-12);
    }

    #[test]
    fn test_magnitude_evolution() {
        // Shifting the redshift by dz moves M* by -Q dz, so phi at M* - Q dz
        // equals phi at M* at z = 0.1 up to the density evolution factor
        let lf = SchechterLf::new(SchechterParams {
            p: 0.0,
            ..gama_params()
        })
        .unwrap();
        assert_relative_eq!(
            lf.phi(-20.7 - 0.7 * 0.4, 0.5),
            lf.phi(-20.7, 0.1),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_cumulative_is_monotone() {
        let lf = SchechterLf::new(gama_params()).unwrap();
        let mags = arange(-24.0, 0.0, 0.01);

        for z in [0.0, 0.1, 0.35, 0.8, 0.99] {
            let curve = lf.phi_cumulative_curve(&mags, z);
            for pair in curve.windows(2) {
                assert!(
                    pair[1] >= pair[0],
                    "cumulative LF decreased toward faint magnitudes at z = {}",
                    z
                );
            }
        }
    }

    #[test]
    fn test_cumulative_matches_numerical_integral() {
        let lf = SchechterLf::new(gama_params()).unwrap();
        let step = 0.001;

        for (mag, z) in [(-21.5, 0.1), (-20.0, 0.3), (-18.0, 0.05)] {
            let grid = arange(-32.0, mag + step / 2.0, step);
            let integral: f64 = grid
                .windows(2)
                .map(|w| (w[1] - w[0]) * (lf.phi(w[0], z) + lf.phi(w[1], z)) / 2.0)
                .sum();

            assert_relative_eq!(lf.phi_cumulative(mag, z), integral, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_cumulative_saturates_to_zero() {
        let lf = SchechterLf::new(gama_params()).unwrap();
        assert_eq!(lf.phi_cumulative(-60.0, 0.1), 0.0);
        assert_eq!(lf.phi(-60.0, 0.1), 0.0);
        // Past the point where t overflows
        assert_eq!(lf.phi_cumulative(-1000.0, 0.1), 0.0);
    }

    #[test]
    fn test_cumulative_faint_limit() {
        // For alpha > -1 the total density converges to Φ* Γ(α+1)
        let lf = SchechterLf::new(SchechterParams {
            alpha: -0.5,
            p: 0.0,
            ..gama_params()
        })
        .unwrap();
        let total = 0.01 * gamma(0.5);
        assert_relative_eq!(lf.phi_cumulative(2000.0, 0.1), total, max_relative = 1e-12);
        assert_relative_eq!(lf.phi_cumulative(10.0, 0.1), total, max_relative = 1e-4);
    }

    #[test]
    fn test_invalid_alpha() {
        for alpha in [-2.0, -2.5, -1.0] {
            let result = SchechterLf::new(SchechterParams {
                alpha,
                ..gama_params()
            });
            assert!(matches!(result, Err(SchechterError::InvalidAlpha(_))));
        }
    }

    #[test]
    fn test_non_finite_parameter() {
        let result = SchechterLf::new(SchechterParams {
            m_star: f64::NAN,
            ..gama_params()
        });
        assert!(matches!(result, Err(SchechterError::NonFinite("m_star", _))));
    }
}
