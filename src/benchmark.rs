//! Benchmark objective functions
//! with analytic gradients.

use std::{f64::consts::PI, ops::RangeInclusive};

/// Global minimum value of the Branin function,
/// attained at three points,
/// including `(pi, 2.275)`.
pub const BRANIN_MINIMUM: f64 = 0.39788735772973816;

/// The Branin function,
/// a two-dimensional benchmark
/// with three global minima.
pub fn branin(point: &[f64]) -> f64 {
    let (a, b, c, r, s, t) = branin_parameters();
    let inner = point[1] - b * point[0].powi(2) + c * point[0] - r;
    a * inner.powi(2) + s * (1.0 - t) * point[0].cos() + s
}

/// Gradient of [`branin`].
pub fn branin_d(point: &[f64]) -> Vec<f64> {
    let (a, b, c, r, s, t) = branin_parameters();
    let inner = point[1] - b * point[0].powi(2) + c * point[0] - r;
    vec![
        2.0 * a * inner * (c - 2.0 * b * point[0]) - s * (1.0 - t) * point[0].sin(),
        2.0 * a * inner,
    ]
}

/// Conventional search bounds for [`branin`],
/// `[-5, 10] x [0, 15]`.
pub fn branin_bounds() -> Vec<RangeInclusive<f64>> {
    vec![-5.0..=10.0, 0.0..=15.0]
}

fn branin_parameters() -> (f64, f64, f64, f64, f64, f64) {
    (
        1.0,
        5.1 / (4.0 * PI.powi(2)),
        5.0 / PI,
        6.0,
        10.0,
        1.0 / (8.0 * PI),
    )
}

/// A strictly convex quadratic
/// with its minimum at `(2, 1)`.
pub fn shifted_sphere(point: &[f64]) -> f64 {
    (point[0] - 2.0).powi(2) + (point[1] - 1.0).powi(2)
}

/// Gradient of [`shifted_sphere`].
pub fn shifted_sphere_d(point: &[f64]) -> Vec<f64> {
    vec![2.0 * (point[0] - 2.0), 2.0 * (point[1] - 1.0)]
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn branin_minimizers() -> [[f64; 2]; 3] {
        [
            [-PI, 12.275],
            [PI, 2.275],
            [3.0 * PI, 2.475],
        ]
    }

    #[test]
    fn branin_should_attain_its_global_minimum_at_all_three_minimizers() {
        for minimizer in branin_minimizers() {
            assert_relative_eq!(branin(&minimizer), BRANIN_MINIMUM, epsilon = 1e-10);
        }
    }

    #[test]
    fn branin_gradient_should_vanish_at_the_minimizers() {
        for minimizer in branin_minimizers() {
            for derivative in branin_d(&minimizer) {
                assert_relative_eq!(derivative, 0.0, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn shifted_sphere_gradient_should_vanish_at_the_minimum() {
        assert_eq!(shifted_sphere(&[2.0, 1.0]), 0.0);
        assert_eq!(shifted_sphere_d(&[2.0, 1.0]), vec![0.0, 0.0]);
    }
}
