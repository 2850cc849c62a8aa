//! Cubic spline interpolation for smooth luminosity function curves.
//!
//! Differential luminosity functions are recovered from tabulated cumulative
//! densities by finite differences, which are noisy at the 0.001 mag level.
//! A cubic spline through those samples gives a smooth curve with
//! continuous first and second derivatives.

use thiserror::Error;

/// Errors that can occur when constructing a spline
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SplineError {
    #[error("Knot and value vectors must have the same length (got {0} and {1})")]
    LengthMismatch(usize, usize),

    #[error("Need at least 2 knots, got {0}")]
    InsufficientKnots(usize),

    #[error("Knots must be strictly increasing (violated at index {0})")]
    NotAscending(usize),
}

/// A natural cubic spline through a set of knots.
///
/// Given $n$ points $(x_i, y_i)$, stores the second derivative of the
/// interpolant at every knot; the second derivative is zero at both ends.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    /// Strictly increasing knots
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at each knot
    y2s: Vec<f64>,
}

impl CubicSpline {
    /// Construct a natural cubic spline from data points.
    ///
    /// # Arguments
    /// * `xs` - Strictly increasing knot positions
    /// * `ys` - Values at each knot (same length as `xs`)
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, SplineError> {
        if xs.len() != ys.len() {
            return Err(SplineError::LengthMismatch(xs.len(), ys.len()));
        }
        if xs.len() < 2 {
            return Err(SplineError::InsufficientKnots(xs.len()));
        }
        for i in 1..xs.len() {
            if !(xs[i] > xs[i - 1]) {
                return Err(SplineError::NotAscending(i));
            }
        }

        let n = xs.len();
        let mut y2s = vec![0.0; n];
        let mut u = vec![0.0; n - 1];

        // Forward sweep of the tridiagonal system
        for i in 1..n - 1 {
            let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
            let p = sig * y2s[i - 1] + 2.0;
            y2s[i] = (sig - 1.0) / p;
            u[i] = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
                - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
            u[i] = (6.0 * u[i] / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
        }

        // Back substitution
        for k in (0..n - 2).rev() {
            y2s[k + 1] = y2s[k + 1] * y2s[k + 2] + u[k + 1];
        }

        Ok(Self { xs, ys, y2s })
    }

    /// Evaluate the spline at `x`.
    ///
    /// Outside the knot range the spline is continued along its end tangent,
    /// which keeps the second derivative continuous at the natural ends.
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();

        if x < self.xs[0] {
            return self.ys[0] + self.end_slope(0) * (x - self.xs[0]);
        }
        if x > self.xs[n - 1] {
            return self.ys[n - 1] + self.end_slope(n - 1) * (x - self.xs[n - 1]);
        }

        let mut lo = 0;
        let mut hi = n - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.xs[mid] > x {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let h = self.xs[hi] - self.xs[lo];
        let a = (self.xs[hi] - x) / h;
        let b = (x - self.xs[lo]) / h;

        a * self.ys[lo]
            + b * self.ys[hi]
            + ((a * a * a - a) * self.y2s[lo] + (b * b * b - b) * self.y2s[hi]) * h * h / 6.0
    }

    /// First derivative at the first or last knot
    fn end_slope(&self, knot: usize) -> f64 {
        let (lo, hi) = if knot == 0 { (0, 1) } else { (knot - 1, knot) };
        let h = self.xs[hi] - self.xs[lo];
        let chord = (self.ys[hi] - self.ys[lo]) / h;

        if knot == 0 {
            chord - h * (2.0 * self.y2s[lo] + self.y2s[hi]) / 6.0
        } else {
            chord + h * (self.y2s[lo] + 2.0 * self.y2s[hi]) / 6.0
        }
    }

    /// Knot range covered by the spline
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spline_passes_through_data_points() {
        let xs = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = vec![2.0, 3.0, 5.0, 4.0, 1.0];
        let spline = CubicSpline::new(xs.clone(), ys.clone()).unwrap();

        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(spline.evaluate(*x), *y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_spline_reproduces_straight_line() {
        // Natural boundary conditions are exact for linear data, inside and out
        let xs: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x - 1.0).collect();
        let spline = CubicSpline::new(xs, ys).unwrap();

        assert_relative_eq!(spline.evaluate(1.25), 2.75, epsilon = 1e-10);
        assert_relative_eq!(spline.evaluate(-1.0), -4.0, epsilon = 1e-10);
        assert_relative_eq!(spline.evaluate(6.0), 17.0, epsilon = 1e-10);
    }

    #[test]
    fn test_spline_smooth_curve() {
        let xs: Vec<f64> = (0..=100).map(|i| i as f64 * 0.05).collect();
        let ys: Vec<f64> = xs.iter().map(|x| x.sin()).collect();
        let spline = CubicSpline::new(xs, ys).unwrap();

        assert_relative_eq!(spline.evaluate(1.234), 1.234_f64.sin(), epsilon = 1e-5);
        assert_eq!(spline.domain(), (0.0, 5.0));
    }

    #[test]
    fn test_extrapolation_follows_end_tangent() {
        // Concave data must not turn back up past the last knot
        let xs: Vec<f64> = (0..=20).map(|i| i as f64 * 0.1).collect();
        let ys: Vec<f64> = xs.iter().map(|x| -x * x).collect();
        let spline = CubicSpline::new(xs, ys).unwrap();

        let slope = (spline.evaluate(2.0) - spline.evaluate(1.999)) / 0.001;
        let beyond = spline.evaluate(3.0);
        assert_relative_eq!(beyond, spline.evaluate(2.0) + slope, epsilon = 1e-2);
        assert!(spline.evaluate(4.0) < beyond);
        assert_relative_eq!(spline.evaluate(-1e-9), spline.evaluate(0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            CubicSpline::new(vec![1.0, 2.0], vec![1.0]),
            Err(SplineError::LengthMismatch(2, 1))
        ));
        assert!(matches!(
            CubicSpline::new(vec![1.0], vec![1.0]),
            Err(SplineError::InsufficientKnots(1))
        ));
        assert!(matches!(
            CubicSpline::new(vec![1.0, 3.0, 2.0], vec![1.0, 2.0, 3.0]),
            Err(SplineError::NotAscending(2))
        ));
    }
}
