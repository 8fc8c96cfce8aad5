//! Step-length selection for line-search descent.
//!
//! A step-length selector chooses how far the minimizer travels
//! along a descent direction each iteration.
//! See [`BacktrackingLineSearch`] for the usual choice.
//!
//! [`BacktrackingLineSearch`]: crate::backtracking_line_search::BacktrackingLineSearch

use std::ops::RangeInclusive;

use crate::StepSize;

/// A component for choosing how far to travel
/// along a descent direction.
pub trait StepLengthSelector<A> {
    /// Select a step-length along `direction` from `point`.
    ///
    /// `value` and `derivatives` are the objective value
    /// and partial derivatives at `point`,
    /// already evaluated by the caller.
    /// Evaluations performed during selection
    /// are reported in the returned [`StepLength`].
    fn select<F>(
        &self,
        f: &F,
        point: &[A],
        value: A,
        derivatives: &[A],
        direction: &[A],
        bounds: &[RangeInclusive<A>],
    ) -> Result<StepLength<A>, StepLengthError<A>>
    where
        F: Fn(&[A]) -> A;
}

/// A step-length chosen by a selector.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepLength<A> {
    /// Distance to travel along the step-direction.
    pub step_size: StepSize<A>,
    /// Objective-function evaluations consumed by the selection.
    pub obj_evals: usize,
    /// Gradient evaluations consumed by the selection.
    pub grad_evals: usize,
}

impl<A> StepLength<A> {
    /// Return a new 'StepLength'.
    pub fn new(step_size: StepSize<A>, obj_evals: usize, grad_evals: usize) -> Self {
        Self {
            step_size,
            obj_evals,
            grad_evals,
        }
    }
}

/// Error returned when a selector fails to produce a step-length.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum StepLengthError<A> {
    /// Sufficient decrease was not reached
    /// before the backtrack budget ran out.
    #[error("no sufficient decrease within {backtracks} backtracks")]
    NoSufficientDecrease {
        /// Backtracks attempted.
        backtracks: usize,
    },
    /// Bounds admit no positive step along the direction.
    #[error("bounds admit no positive step from {point:?}")]
    NoFeasibleStep {
        /// Point the search was blocked at.
        point: Vec<A>,
    },
}

/// A selector returning the same step-length every iteration,
/// consuming no evaluations.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedStepSize<A>(pub StepSize<A>);

impl<A> StepLengthSelector<A> for FixedStepSize<A>
where
    A: Copy,
{
    fn select<F>(
        &self,
        _f: &F,
        _point: &[A],
        _value: A,
        _derivatives: &[A],
        _direction: &[A],
        _bounds: &[RangeInclusive<A>],
    ) -> Result<StepLength<A>, StepLengthError<A>>
    where
        F: Fn(&[A]) -> A,
    {
        Ok(StepLength::new(self.0, 0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_step_size_should_return_its_configured_step() {
        let step_size = StepSize::new(0.25).unwrap();
        let length = FixedStepSize(step_size)
            .select(
                &(|point: &[f64]| point[0]),
                &[1.0],
                1.0,
                &[1.0],
                &[-1.0],
                &[-10.0..=10.0],
            )
            .unwrap();
        assert_eq!(length, StepLength::new(step_size, 0, 0));
    }
}
