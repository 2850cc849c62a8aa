//! Piecewise-linear interpolation on sorted 1D grids.
//!
//! Every lookup in this crate has to keep a numerical pipeline running, so
//! queries outside the tabulated range are never rejected: they are
//! extrapolated along the first or last segment. Validation happens once,
//! when a table is built.
//!
//! - **Interp1d**: validated table with O(log n) lookups
//! - **invert_sorted**: magnitude lookup against a sampled, non-decreasing
//!   curve (the `searchsorted` + linear bracket pattern)
//! - **arange**: half-open regular grids with the usual `arange` length rules

use thiserror::Error;

/// Errors that can occur while building an interpolation table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpError {
    #[error("Input vectors must have at least 2 points")]
    InsufficientData,
    #[error("Input vectors must have the same length (got {0} and {1})")]
    MismatchedLengths(usize, usize),
    #[error("X values must be sorted in strictly ascending order (violated at index {0})")]
    UnsortedData(usize),
    #[error("Non-finite value at index {0}")]
    NonFinite(usize),
}

/// Regular grid `start, start + step, ...` stopping before `stop`.
///
/// The number of points is `ceil((stop - start) / step)` and point `i` is
/// `start + i * step`, so negative steps produce descending grids. A zero or
/// non-finite step gives an empty grid.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let n = ((stop - start) / step).ceil();
    if !(n > 0.0 && n.is_finite()) {
        return Vec::new();
    }
    (0..n as usize).map(|i| start + i as f64 * step).collect()
}

/// Upper index of the segment used to interpolate `value` in `sorted`.
///
/// Mirrors a left-sided `searchsorted`, clamped to `[1, len - 1]` so that
/// values beyond either end reuse the boundary segment.
///
/// `sorted` must hold at least two points.
pub fn bracket(sorted: &[f64], value: f64) -> usize {
    let idx = sorted.partition_point(|&v| v < value);
    idx.clamp(1, sorted.len() - 1)
}

fn lerp(x: f64, x1: f64, x2: f64, y1: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    if dx == 0.0 || !dx.is_finite() {
        // Degenerate segment, e.g. a plateau or -inf tail in a sampled curve
        return y1;
    }
    y1 + (x - x1) / dx * (y2 - y1)
}

/// Finds the abscissa at which a sampled non-decreasing curve reaches `target`.
///
/// `curve[i]` is the curve value at `abscissa[i]`. The bracketing samples are
/// interpolated linearly; targets outside the curve's range are extrapolated
/// along the boundary segment.
///
/// Both slices must have the same length of at least two.
pub fn invert_sorted(curve: &[f64], abscissa: &[f64], target: f64) -> f64 {
    let idx = bracket(curve, target);
    lerp(
        target,
        curve[idx - 1],
        curve[idx],
        abscissa[idx - 1],
        abscissa[idx],
    )
}

/// Forces a sampled curve to be non-decreasing.
///
/// NaN samples (for example `log10` of a cumulative density that cancelled
/// to zero in the far bright tail) are treated as `-inf` before the running
/// maximum is taken.
pub fn make_non_decreasing(curve: &mut [f64]) {
    let mut running = f64::NEG_INFINITY;
    for v in curve.iter_mut() {
        if v.is_nan() {
            *v = f64::NEG_INFINITY;
        }
        if *v < running {
            *v = running;
        }
        running = *v;
    }
}

/// Linear interpolator over a validated, strictly ascending table.
#[derive(Debug, Clone, PartialEq)]
pub struct Interp1d {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Interp1d {
    /// Builds an interpolator from matching x and y tables.
    ///
    /// # Errors
    ///
    /// * `InterpError::MismatchedLengths` - xs and ys have different lengths
    /// * `InterpError::InsufficientData` - Less than 2 data points provided
    /// * `InterpError::UnsortedData` - xs is not strictly ascending
    /// * `InterpError::NonFinite` - an x value is NaN or infinite
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, InterpError> {
        if xs.len() != ys.len() {
            return Err(InterpError::MismatchedLengths(xs.len(), ys.len()));
        }

        if xs.len() < 2 {
            return Err(InterpError::InsufficientData);
        }

        if let Some(i) = xs.iter().position(|x| !x.is_finite()) {
            return Err(InterpError::NonFinite(i));
        }

        for i in 1..xs.len() {
            if xs[i] <= xs[i - 1] {
                return Err(InterpError::UnsortedData(i));
            }
        }

        Ok(Self { xs, ys })
    }

    /// Interpolated value at `x`, extrapolated linearly outside the table.
    pub fn eval(&self, x: f64) -> f64 {
        let idx = bracket(&self.xs, x);
        if self.xs[idx] == x {
            return self.ys[idx];
        }
        lerp(
            x,
            self.xs[idx - 1],
            self.xs[idx],
            self.ys[idx - 1],
            self.ys[idx],
        )
    }

    /// Tabulated x values.
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Tabulated y values.
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_match() {
        let interp = Interp1d::new(vec![1.0, 2.0, 3.0, 4.0], vec![10.0, 20.0, 30.0, 40.0]).unwrap();
        assert_eq!(interp.eval(2.0), 20.0);
        assert_eq!(interp.eval(1.0), 10.0);
        assert_eq!(interp.eval(4.0), 40.0);
    }

    #[test]
    fn test_linear_interpolation() {
        let interp = Interp1d::new(vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]).unwrap();
        assert_relative_eq!(interp.eval(1.5), 15.0);
        assert_relative_eq!(interp.eval(2.5), 25.0);
    }

    #[test]
    fn test_extrapolation_uses_boundary_slope() {
        let interp = Interp1d::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 4.0]).unwrap();
        // Slope 1 below the table, slope 3 above it
        assert_relative_eq!(interp.eval(-1.0), -1.0);
        assert_relative_eq!(interp.eval(3.0), 7.0);
    }

    #[test]
    fn test_mismatched_lengths() {
        assert!(matches!(
            Interp1d::new(vec![1.0, 2.0, 3.0], vec![10.0, 20.0]),
            Err(InterpError::MismatchedLengths(3, 2))
        ));
    }

    #[test]
    fn test_insufficient_data() {
        assert!(matches!(
            Interp1d::new(vec![1.0], vec![10.0]),
            Err(InterpError::InsufficientData)
        ));
    }

    #[test]
    fn test_unsorted_data() {
        assert!(matches!(
            Interp1d::new(vec![2.0, 1.0, 3.0], vec![20.0, 10.0, 30.0]),
            Err(InterpError::UnsortedData(1))
        ));
    }

    #[test]
    fn test_non_finite_x() {
        assert!(matches!(
            Interp1d::new(vec![1.0, f64::NAN, 3.0], vec![1.0, 2.0, 3.0]),
            Err(InterpError::NonFinite(1))
        ));
    }

    #[test]
    fn test_arange_lengths() {
        assert_eq!(arange(0.0, 1.0, 0.01).len(), 100);
        assert_eq!(arange(0.0, 1.001, 0.05).len(), 21);
        assert_eq!(arange(-16.0, -24.0, -0.1).len(), 80);
        assert_eq!(arange(-10.0, -25.0000001, -0.001).len(), 15001);
        assert!(arange(1.0, 0.0, 0.1).is_empty());
        assert!(arange(0.0, 1.0, 0.0).is_empty());
        assert!(arange(0.0, 1.0, f64::INFINITY).is_empty());
    }

    #[test]
    fn test_arange_values() {
        let grid = arange(0.0, 1.001, 0.05);
        assert_eq!(grid[0], 0.0);
        assert_relative_eq!(grid[20], 1.0, epsilon = 1e-12);

        let descending = arange(-16.0, -24.0, -0.1);
        assert_eq!(descending[0], -16.0);
        assert_relative_eq!(descending[79], -23.9, epsilon = 1e-12);
    }

    #[test]
    fn test_bracket_clamps_to_boundary_segments() {
        let sorted = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(bracket(&sorted, -5.0), 1);
        assert_eq!(bracket(&sorted, 0.5), 1);
        assert_eq!(bracket(&sorted, 2.0), 2);
        assert_eq!(bracket(&sorted, 2.5), 3);
        assert_eq!(bracket(&sorted, 10.0), 3);
    }

    #[test]
    fn test_invert_sorted() {
        // Curve y = 2x sampled at x = 0..3
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 2.0, 4.0, 6.0];
        assert_relative_eq!(invert_sorted(&ys, &xs, 3.0), 1.5);
        assert_relative_eq!(invert_sorted(&ys, &xs, 4.0), 2.0);
        assert_relative_eq!(invert_sorted(&ys, &xs, 8.0), 4.0);
        assert_relative_eq!(invert_sorted(&ys, &xs, -2.0), -1.0);
    }

    #[test]
    fn test_invert_sorted_flat_segment() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [1.0, 1.0, 2.0];
        assert_eq!(invert_sorted(&ys, &xs, 1.0), 0.0);
    }

    #[test]
    fn test_make_non_decreasing() {
        let mut curve = vec![f64::NAN, -30.0, -31.0, -20.0, -25.0, -10.0];
        make_non_decreasing(&mut curve);
        assert_eq!(curve[0], f64::NEG_INFINITY);
        assert_eq!(&curve[1..], &[-30.0, -30.0, -20.0, -20.0, -10.0]);
    }
}
