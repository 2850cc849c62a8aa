//! Straight-line least squares fitting
//!
//! Used to fit a power law (a straight line in log space) to the faint end
//! of a luminosity function before extrapolating it.

use ndarray::Array1;
use thiserror::Error;

/// Result of fitting `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    /// Evaluate the fitted line at `x`
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Errors that can occur during line fitting
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    #[error("insufficient data: expected at least {expected}, got {got}")]
    InsufficientData { expected: usize, got: usize },

    #[error("length mismatch: x has {x_len} points, y has {y_len}")]
    LengthMismatch { x_len: usize, y_len: usize },

    #[error("x values have zero variance")]
    ZeroVariance,

    #[error("non-finite value in fit data")]
    NonFinite,
}

/// Minimum number of points for a line fit
const MIN_DATA_POINTS: usize = 2;

/// Ordinary least squares fit of a straight line.
///
/// # Arguments
/// * `xs` - Independent variable
/// * `ys` - Dependent variable
///
/// # Returns
/// * `Ok(LineFit)` - Fitted slope and intercept
/// * `Err(FitError)` - If fitting fails
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Result<LineFit, FitError> {
    if xs.len() != ys.len() {
        return Err(FitError::LengthMismatch {
            x_len: xs.len(),
            y_len: ys.len(),
        });
    }

    if xs.len() < MIN_DATA_POINTS {
        return Err(FitError::InsufficientData {
            expected: MIN_DATA_POINTS,
            got: xs.len(),
        });
    }

    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite);
    }

    let x = Array1::from_vec(xs.to_vec());
    let y = Array1::from_vec(ys.to_vec());

    let x_mean = x.mean().unwrap_or(0.0);
    let y_mean = y.mean().unwrap_or(0.0);
    let x_centered = &x - x_mean;
    let y_centered = &y - y_mean;

    let sxx = x_centered.dot(&x_centered);
    if sxx == 0.0 {
        return Err(FitError::ZeroVariance);
    }

    let slope = x_centered.dot(&y_centered) / sxx;
    let intercept = y_mean - slope * x_mean;

    Ok(LineFit { slope, intercept })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_line() {
        let xs: Vec<f64> = (0..20).map(|i| -19.5 + i as f64 * 0.15).collect();
        let ys: Vec<f64> = xs.iter().map(|x| -0.4 * x - 10.0).collect();

        let fit = fit_line(&xs, &ys).unwrap();
        assert_relative_eq!(fit.slope, -0.4, epsilon = 1e-10);
        assert_relative_eq!(fit.intercept, -10.0, epsilon = 1e-9);
        assert_relative_eq!(fit.eval(-17.0), -3.2, epsilon = 1e-9);
    }

    #[test]
    fn test_symmetric_noise_cancels() {
        let xs = vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
        let ys = vec![0.9, 1.1, 2.9, 3.1, 4.9, 5.1];

        let fit = fit_line(&xs, &ys).unwrap();
        assert_relative_eq!(fit.slope, 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.intercept, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            fit_line(&[1.0, 2.0], &[1.0]),
            Err(FitError::LengthMismatch { x_len: 2, y_len: 1 })
        ));
        assert!(matches!(
            fit_line(&[1.0], &[1.0]),
            Err(FitError::InsufficientData { .. })
        ));
        assert!(matches!(
            fit_line(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]),
            Err(FitError::ZeroVariance)
        ));
        assert!(matches!(
            fit_line(&[1.0, 2.0], &[1.0, f64::NEG_INFINITY]),
            Err(FitError::NonFinite)
        ));
    }
}
