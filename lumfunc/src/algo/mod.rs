//! Numerical algorithms shared by the luminosity function models
//!
//! This module provides interpolation on sorted grids, spline smoothing,
//! straight-line fitting and trapezoidal integration.

pub mod fit;
pub mod interp;
pub mod spline;
pub mod trapezoid;

pub use fit::{fit_line, FitError, LineFit};
pub use interp::{arange, invert_sorted, make_non_decreasing, Interp1d, InterpError};
pub use spline::{CubicSpline, SplineError};
pub use trapezoid::{cumulative_trap_integrate, TrapezoidError};
