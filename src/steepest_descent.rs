//! Steepest-descent minimization
//! with pluggable step-length selection
//! and gradient computation.
//!
//! Derivatives are normalized to a unit step-direction,
//! so the step-length selector controls
//! the full distance traveled each iteration.

use std::{fmt, iter::Sum, ops::RangeInclusive};

use derive_builder::Builder;
use derive_getters::{Dissolve, Getters};
use num_traits::{real::Real, AsPrimitive};
use rand::{
    distributions::{uniform::SampleUniform, Uniform},
    prelude::*,
};

use crate::{
    descend,
    gradient::GradientOracle,
    infinity_norm,
    step_length::{StepLengthError, StepLengthSelector},
    StepSize,
};

pub use self::types::*;

/// Steepest-descent configuration parameters.
#[derive(Clone, Copy, Debug, PartialEq, Builder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[builder(build_fn(skip))]
pub struct SteepestDescent<A> {
    /// Convergence tolerance
    /// for the gradient infinity-norm.
    pub tolerance: Tolerance<A>,
    /// Iterations to run before giving up.
    pub max_iterations: usize,
}

impl<A> SteepestDescentBuilder<A> {
    /// Builds a new [`SteepestDescent`],
    /// filling missing fields with defaults.
    pub fn build(&mut self) -> SteepestDescent<A>
    where
        A: 'static + Copy + Real,
        f64: AsPrimitive<A>,
    {
        SteepestDescent {
            tolerance: self.tolerance.unwrap_or_default(),
            max_iterations: self.max_iterations.unwrap_or(100),
        }
    }
}

impl<A> SteepestDescent<A> {
    /// Return a new 'SteepestDescent'.
    pub fn new(tolerance: Tolerance<A>, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }
}

impl<A> Default for SteepestDescent<A>
where
    A: 'static + Copy + Real,
    f64: AsPrimitive<A>,
{
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            max_iterations: 100,
        }
    }
}

impl<A> SteepestDescent<A>
where
    A: 'static + Copy + fmt::Debug + Real + Sum,
{
    /// Return a point approximately satisfying
    /// the first-order optimality condition,
    /// `||grad f(x)||_inf < tolerance`,
    /// or the iterate reached when `max_iterations` ran out,
    /// whichever comes first.
    pub fn minimize<F, G, S>(
        &self,
        f: F,
        oracle: G,
        step_length: S,
        bounds: &[RangeInclusive<A>],
        initial_point: Vec<A>,
    ) -> Result<Minimum<A>, SteepestDescentError<A>>
    where
        F: Fn(&[A]) -> A,
        G: GradientOracle<A>,
        S: StepLengthSelector<A>,
    {
        self.minimize_observing(f, oracle, step_length, bounds, initial_point, |_| {})
    }

    /// Like [`minimize`],
    /// calling `observe` with each iteration's [`Progress`].
    ///
    /// [`minimize`]: SteepestDescent::minimize
    pub fn minimize_observing<F, G, S, O>(
        &self,
        f: F,
        oracle: G,
        step_length: S,
        bounds: &[RangeInclusive<A>],
        initial_point: Vec<A>,
        mut observe: O,
    ) -> Result<Minimum<A>, SteepestDescentError<A>>
    where
        F: Fn(&[A]) -> A,
        G: GradientOracle<A>,
        S: StepLengthSelector<A>,
        O: FnMut(&Progress<A>),
    {
        let mut point = initial_point;
        let mut value = f(&point);
        let mut trace = Trace::seeded(point.clone());
        let mut iteration = 0;
        while iteration < self.max_iterations {
            let derivatives = oracle.gradient(&f, &point);
            let norm = derivatives.iter().map(|x| x.powi(2)).sum::<A>().sqrt();
            if norm == A::zero() {
                return Err(SteepestDescentError::DegenerateGradient { point });
            }
            let gradient_infinity_norm = infinity_norm(&derivatives);
            if gradient_infinity_norm < self.tolerance.into_inner() {
                break;
            }
            let direction = derivatives.iter().map(|x| -*x / norm).collect::<Vec<_>>();
            let length =
                step_length.select(&f, &point, value, &derivatives, &direction, bounds)?;
            point = descend(&point, length.step_size, &direction);
            value = f(&point);
            iteration += 1;
            let progress = Progress {
                iteration,
                obj_calls: length.obj_evals + 1,
                grad_calls: length.grad_evals,
                step_size: length.step_size,
                point: point.clone(),
                value,
                gradient_infinity_norm,
            };
            observe(&progress);
            trace.push(progress);
        }
        Ok(Minimum {
            point,
            value,
            trace,
        })
    }

    /// Like [`minimize`],
    /// starting from a point uniformly sampled within `bounds`.
    ///
    /// This may be nondeterministic.
    ///
    /// [`minimize`]: SteepestDescent::minimize
    pub fn minimize_with_random_point<F, G, S>(
        &self,
        f: F,
        oracle: G,
        step_length: S,
        bounds: &[RangeInclusive<A>],
    ) -> Result<Minimum<A>, SteepestDescentError<A>>
    where
        A: SampleUniform,
        F: Fn(&[A]) -> A,
        G: GradientOracle<A>,
        S: StepLengthSelector<A>,
    {
        self.minimize_with_random_point_using(f, oracle, step_length, bounds, &mut thread_rng())
    }

    /// Like [`minimize_with_random_point`],
    /// sampling the starting point using `rng`.
    ///
    /// [`minimize_with_random_point`]: SteepestDescent::minimize_with_random_point
    pub fn minimize_with_random_point_using<F, G, S, R>(
        &self,
        f: F,
        oracle: G,
        step_length: S,
        bounds: &[RangeInclusive<A>],
        rng: &mut R,
    ) -> Result<Minimum<A>, SteepestDescentError<A>>
    where
        A: SampleUniform,
        F: Fn(&[A]) -> A,
        G: GradientOracle<A>,
        S: StepLengthSelector<A>,
        R: Rng,
    {
        let initial_point = bounds
            .iter()
            .map(|range| Uniform::new_inclusive(range.start(), range.end()).sample(rng))
            .collect();
        self.minimize(f, oracle, step_length, bounds, initial_point)
    }
}

/// Error terminating a steepest-descent run.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum SteepestDescentError<A> {
    /// Gradient vanished exactly,
    /// leaving no descent direction.
    #[error("gradient is zero at {point:?}: no descent direction")]
    DegenerateGradient {
        /// Point the gradient vanished at.
        point: Vec<A>,
    },
    /// Step-length selection failed.
    #[error(transparent)]
    StepLength(#[from] StepLengthError<A>),
}

/// A minimum discovered by a steepest-descent run.
#[derive(Clone, Debug, PartialEq, Getters, Dissolve)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[dissolve(rename = "into_parts")]
pub struct Minimum<A> {
    /// Terminal iterate.
    point: Vec<A>,
    /// Objective value of the terminal iterate.
    value: A,
    /// Per-iteration history of the run.
    trace: Trace<A>,
}

/// Per-iteration history of a steepest-descent run,
/// four parallel sequences sharing an index.
#[derive(Clone, Debug, PartialEq, Getters, Dissolve)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[dissolve(rename = "into_parts")]
pub struct Trace<A> {
    /// Infinity-norm of the gradient
    /// at each pre-step iterate.
    gradient_infinity_norms: Vec<A>,
    /// Every iterate,
    /// starting point first,
    /// so one longer than the other sequences.
    iterates: Vec<Vec<A>>,
    /// Objective evaluations consumed by each iteration,
    /// line-search evaluations plus the post-step evaluation.
    obj_call_counts: Vec<usize>,
    /// Objective value at each post-step iterate.
    values: Vec<A>,
}

impl<A> Trace<A> {
    fn seeded(initial_point: Vec<A>) -> Self {
        Self {
            gradient_infinity_norms: Vec::new(),
            iterates: vec![initial_point],
            obj_call_counts: Vec::new(),
            values: Vec::new(),
        }
    }

    fn push(&mut self, progress: Progress<A>) {
        self.gradient_infinity_norms
            .push(progress.gradient_infinity_norm);
        self.iterates.push(progress.point);
        self.obj_call_counts.push(progress.obj_calls);
        self.values.push(progress.value);
    }

    /// Return the number of iterations recorded.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return whether no iterations were recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A report on one completed iteration.
///
/// Displays as a single progress line,
/// suitable for printing from an observer.
#[derive(Clone, Debug, PartialEq, Getters)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Progress<A> {
    /// One-based iteration index.
    iteration: usize,
    /// Objective evaluations consumed by the iteration,
    /// line-search evaluations plus the post-step evaluation.
    obj_calls: usize,
    /// Gradient evaluations consumed by the line search.
    grad_calls: usize,
    /// Step-size taken.
    step_size: StepSize<A>,
    /// Post-step iterate.
    point: Vec<A>,
    /// Objective value of the post-step iterate.
    value: A,
    /// Infinity-norm of the gradient
    /// at the pre-step iterate.
    gradient_infinity_norm: A,
}

impl<A> fmt::Display for Progress<A>
where
    A: Copy + fmt::Debug + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "iteration {}, nfcalls: {}, ngcalls: {}, alpha: {:.7}, xk: {:?}, fk: {:.6}, gradient norm: {:.6}",
            self.iteration,
            self.obj_calls,
            self.grad_calls,
            self.step_size.into_inner(),
            self.point,
            self.value,
            self.gradient_infinity_norm,
        )
    }
}

mod types {
    use std::cmp::Ordering;

    use derive_more::Display;
    use num_traits::{bounds::LowerBounded, real::Real, AsPrimitive};

    /// Convergence tolerance
    /// for the gradient infinity-norm.
    #[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct Tolerance<A>(A);

    /// Error returned when 'Tolerance' is given an invalid value.
    #[derive(Clone, Copy, Debug, thiserror::Error, PartialEq)]
    pub enum InvalidToleranceError<A> {
        /// Value is NaN.
        #[error("{0} is NaN")]
        IsNan(A),
        /// Value is below lower bound.
        #[error("{0} is below lower bound")]
        TooLow(A),
    }

    impl<A> Tolerance<A>
    where
        A: Real,
    {
        /// Return a new 'Tolerance' if given a valid value.
        pub fn new(value: A) -> Result<Self, InvalidToleranceError<A>> {
            match Self(value).partial_cmp(&Self::min_value()) {
                None => Err(InvalidToleranceError::IsNan(value)),
                Some(Ordering::Less) => Err(InvalidToleranceError::TooLow(value)),
                _ => Ok(Self(value)),
            }
        }
    }

    impl<A> Tolerance<A> {
        /// Unwrap 'Tolerance' into inner value.
        pub fn into_inner(self) -> A {
            self.0
        }
    }

    impl<A> Default for Tolerance<A>
    where
        A: 'static + Copy,
        f64: AsPrimitive<A>,
    {
        fn default() -> Self {
            Self(1e-5.as_())
        }
    }

    impl<A> LowerBounded for Tolerance<A>
    where
        A: Real,
    {
        fn min_value() -> Self {
            Self(A::zero() + A::epsilon())
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::{
        backtracking_line_search::BacktrackingLineSearch,
        benchmark::{shifted_sphere, shifted_sphere_d},
        gradient::Analytic,
        step_length::StepLengthError,
    };

    use super::*;

    fn unbounded() -> Vec<RangeInclusive<f64>> {
        vec![-100.0..=100.0, -100.0..=100.0]
    }

    fn optimizer(max_iterations: usize) -> SteepestDescent<f64> {
        SteepestDescentBuilder::default()
            .max_iterations(max_iterations)
            .build()
    }

    #[test]
    fn minimize_should_converge_on_a_strictly_convex_quadratic() {
        let minimum = optimizer(50)
            .minimize(
                shifted_sphere,
                Analytic(shifted_sphere_d),
                BacktrackingLineSearch::default(),
                &unbounded(),
                vec![0.0, 0.0],
            )
            .unwrap();
        assert!(minimum.trace().len() < 50);
        assert_relative_eq!(minimum.point()[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(minimum.point()[1], 1.0, epsilon = 1e-4);
        let derivatives = shifted_sphere_d(minimum.point());
        assert!(derivatives.iter().all(|x| x.abs() < 1e-5));
    }

    #[test]
    fn minimize_should_never_increase_the_objective() {
        let minimum = optimizer(50)
            .minimize(
                shifted_sphere,
                Analytic(shifted_sphere_d),
                BacktrackingLineSearch::default(),
                &unbounded(),
                vec![0.0, 0.0],
            )
            .unwrap();
        let values = minimum.trace().values();
        assert!(values[0] <= shifted_sphere(&[0.0, 0.0]));
        assert!(values.windows(2).all(|pair| pair[1] <= pair[0]));
    }

    #[test]
    fn minimize_should_record_one_trace_entry_per_iteration() {
        let minimum = optimizer(50)
            .minimize(
                shifted_sphere,
                Analytic(shifted_sphere_d),
                BacktrackingLineSearch::default(),
                &unbounded(),
                vec![0.0, 0.0],
            )
            .unwrap();
        let iterations = minimum.trace().len();
        assert!(iterations > 0);
        let (gradient_infinity_norms, iterates, obj_call_counts, values) =
            minimum.into_parts().2.into_parts();
        assert_eq!(gradient_infinity_norms.len(), iterations);
        assert_eq!(iterates.len(), iterations + 1);
        assert_eq!(obj_call_counts.len(), iterations);
        assert_eq!(values.len(), iterations);
        assert_eq!(iterates[0], vec![0.0, 0.0]);
        assert!(obj_call_counts.iter().all(|count| *count >= 2));
    }

    #[test]
    fn minimize_should_take_unit_steps() {
        let mut step_sizes = Vec::new();
        let minimum = optimizer(50)
            .minimize_observing(
                shifted_sphere,
                Analytic(shifted_sphere_d),
                BacktrackingLineSearch::default(),
                &unbounded(),
                vec![0.0, 0.0],
                |progress| step_sizes.push(progress.step_size().into_inner()),
            )
            .unwrap();
        let iterates = minimum.trace().iterates();
        for (pair, step_size) in iterates.windows(2).zip(step_sizes) {
            let distance = pair[1]
                .iter()
                .zip(&pair[0])
                .map(|(x, y)| (x - y).powi(2))
                .sum::<f64>()
                .sqrt();
            assert_relative_eq!(distance / step_size, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn minimize_should_perform_zero_iterations_when_started_within_tolerance() {
        let minimum = optimizer(50)
            .minimize(
                |point: &[f64]| 1e-12 * shifted_sphere(point),
                Analytic(|point: &[f64]| {
                    shifted_sphere_d(point)
                        .iter()
                        .map(|x| 1e-12 * x)
                        .collect::<Vec<_>>()
                }),
                BacktrackingLineSearch::default(),
                &unbounded(),
                vec![0.0, 0.0],
            )
            .unwrap();
        assert_eq!(minimum.point(), &vec![0.0, 0.0]);
        assert!(minimum.trace().is_empty());
    }

    #[test]
    fn minimize_should_return_the_starting_point_when_out_of_iterations() {
        let minimum = optimizer(0)
            .minimize(
                shifted_sphere,
                Analytic(shifted_sphere_d),
                BacktrackingLineSearch::default(),
                &unbounded(),
                vec![0.0, 0.0],
            )
            .unwrap();
        assert_eq!(minimum.point(), &vec![0.0, 0.0]);
        assert_eq!(*minimum.value(), shifted_sphere(&[0.0, 0.0]));
        assert!(minimum.trace().is_empty());
    }

    #[test]
    fn minimize_should_fail_when_the_gradient_vanishes() {
        let result = optimizer(50).minimize(
            shifted_sphere,
            Analytic(shifted_sphere_d),
            BacktrackingLineSearch::default(),
            &unbounded(),
            vec![2.0, 1.0],
        );
        assert_eq!(
            result,
            Err(SteepestDescentError::DegenerateGradient {
                point: vec![2.0, 1.0]
            })
        );
    }

    #[test]
    fn minimize_should_propagate_step_length_failure() {
        let line_search = BacktrackingLineSearch {
            max_backtracks: 2,
            ..BacktrackingLineSearch::default()
        };
        let result = optimizer(50).minimize(
            |point: &[f64]| (point[0] - 0.05).powi(2) + point[1].powi(2),
            Analytic(|point: &[f64]| vec![2.0 * (point[0] - 0.05), 2.0 * point[1]]),
            line_search,
            &unbounded(),
            vec![0.0, 0.0],
        );
        assert_eq!(
            result,
            Err(SteepestDescentError::StepLength(
                StepLengthError::NoSufficientDecrease { backtracks: 2 }
            ))
        );
    }

    #[test]
    fn minimize_should_keep_iterates_within_bounds() {
        let bounds = vec![0.0..=0.5, 0.0..=0.5];
        let minimum = optimizer(1)
            .minimize(
                shifted_sphere,
                Analytic(shifted_sphere_d),
                BacktrackingLineSearch::default(),
                &bounds,
                vec![0.1, 0.1],
            )
            .unwrap();
        for iterate in minimum.trace().iterates() {
            for (x, range) in iterate.iter().zip(&bounds) {
                assert!(range.contains(x) || (x - range.end()).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn minimize_should_fail_when_bounds_block_every_step() {
        let result = optimizer(50).minimize(
            shifted_sphere,
            Analytic(shifted_sphere_d),
            BacktrackingLineSearch::default(),
            &[0.0..=0.5, 0.0..=0.25],
            vec![0.5, 0.25],
        );
        assert!(matches!(
            result,
            Err(SteepestDescentError::StepLength(
                StepLengthError::NoFeasibleStep { .. }
            ))
        ));
    }

    #[test]
    fn minimize_observing_should_report_every_iteration() {
        let mut observed = 0;
        let minimum = optimizer(50)
            .minimize_observing(
                shifted_sphere,
                Analytic(shifted_sphere_d),
                BacktrackingLineSearch::default(),
                &unbounded(),
                vec![0.0, 0.0],
                |_| observed += 1,
            )
            .unwrap();
        assert_eq!(observed, minimum.trace().len());
    }

    #[test]
    fn progress_should_display_as_one_line() {
        let progress = Progress {
            iteration: 3,
            obj_calls: 5,
            grad_calls: 0,
            step_size: StepSize::new(0.5).unwrap(),
            point: vec![0.5, 0.25],
            value: 2.8125,
            gradient_infinity_norm: 3.0,
        };
        assert_eq!(
            progress.to_string(),
            "iteration 3, nfcalls: 5, ngcalls: 0, alpha: 0.5000000, xk: [0.5, 0.25], fk: 2.812500, gradient norm: 3.000000"
        );
    }
}
