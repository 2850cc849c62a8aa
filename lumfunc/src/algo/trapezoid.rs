//! Trapezoidal integration utility

use thiserror::Error;

/// Errors that can occur during trapezoidal integration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrapezoidError {
    #[error("Insufficient points for integration, need at least 2 points")]
    InsufficientPoints,

    #[error("Points must be in ascending order")]
    NotAscending,
}

/// Running trapezoidal integral of `to_integrate` over a set of points.
///
/// # Arguments
///
/// * `corners` - The x coordinates of the trapezoid corners in ascending order
/// * `to_integrate` - The function to integrate
///
/// # Returns
///
/// One value per corner: the integral from `corners[0]` up to that corner,
/// so the first entry is always 0.
pub fn cumulative_trap_integrate<F>(
    corners: &[f64],
    to_integrate: F,
) -> Result<Vec<f64>, TrapezoidError>
where
    F: Fn(f64) -> f64,
{
    if corners.len() < 2 {
        return Err(TrapezoidError::InsufficientPoints);
    }

    for i in 1..corners.len() {
        if corners[i] <= corners[i - 1] {
            return Err(TrapezoidError::NotAscending);
        }
    }

    let mut integral = Vec::with_capacity(corners.len());
    integral.push(0.0);

    let mut running = 0.0;
    let mut y_left = to_integrate(corners[0]);
    for window in corners.windows(2) {
        let y_right = to_integrate(window[1]);

        // ∫[x₁,x₂] f(x)dx ≈ (x₂-x₁) × (f(x₁)+f(x₂))/2
        running += (window[1] - window[0]) * (y_left + y_right) / 2.0;
        integral.push(running);

        y_left = y_right;
    }

    Ok(integral)
}
