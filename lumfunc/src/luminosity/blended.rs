//! Smooth blend of two luminosity functions across a redshift transition

use super::LuminosityFunction;

/// Logistic weight `1 / (1 + exp(steepness (x - center)))`.
///
/// Close to 1 well below `center` and close to 0 well above it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticTransition {
    pub center: f64,
    pub steepness: f64,
}

impl LogisticTransition {
    pub fn new(center: f64, steepness: f64) -> Self {
        Self { center, steepness }
    }

    /// Weight of the lower-side component at `x`
    pub fn weight(&self, x: f64) -> f64 {
        1.0 / (1.0 + (self.steepness * (x - self.center)).exp())
    }
}

impl Default for LogisticTransition {
    /// Low-redshift to high-redshift hand-over at z = 0.15
    fn default() -> Self {
        Self::new(0.15, 120.0)
    }
}

/// Weighted combination of a low-redshift and a high-redshift LF.
///
/// Both components are always evaluated, even where their weight is
/// negligible.
#[derive(Debug, Clone)]
pub struct BlendedLf<Lo, Hi> {
    low: Lo,
    high: Hi,
    transition: LogisticTransition,
}

impl<Lo, Hi> BlendedLf<Lo, Hi> {
    /// Blend with the default transition at z = 0.15
    pub fn new(low: Lo, high: Hi) -> Self {
        Self::with_transition(low, high, LogisticTransition::default())
    }

    pub fn with_transition(low: Lo, high: Hi, transition: LogisticTransition) -> Self {
        Self {
            low,
            high,
            transition,
        }
    }

    /// Weight given to the low-redshift LF at `redshift`
    pub fn transition(&self, redshift: f64) -> f64 {
        self.transition.weight(redshift)
    }

    pub fn low(&self) -> &Lo {
        &self.low
    }

    pub fn high(&self) -> &Hi {
        &self.high
    }
}

impl<Lo: LuminosityFunction, Hi: LuminosityFunction> LuminosityFunction for BlendedLf<Lo, Hi> {
    fn phi(&self, magnitude: f64, redshift: f64) -> f64 {
        let w = self.transition(redshift);
        w * self.low.phi(magnitude, redshift) + (1.0 - w) * self.high.phi(magnitude, redshift)
    }

    fn phi_cumulative(&self, magnitude: f64, redshift: f64) -> f64 {
        let w = self.transition(redshift);
        w * self.low.phi_cumulative(magnitude, redshift)
            + (1.0 - w) * self.high.phi_cumulative(magnitude, redshift)
    }
}
