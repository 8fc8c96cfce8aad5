#![warn(missing_debug_implementations)]
#![warn(missing_docs)]

//! Steepest-descent minimization
//! with line-search step-length selection.
//!
//! Each iteration evaluates the gradient of the objective function
//! at the current iterate,
//! steps along the unit direction of steepest descent
//! as far as a step-length selector allows,
//! and records the iterate, objective value, gradient norm,
//! and evaluation counts,
//! until the gradient infinity-norm drops below tolerance
//! or the iteration cap runs out.
//!
//! # Examples
//!
//! ```
//! use descent::{
//!     backtracking_line_search::BacktrackingLineSearch, gradient::Analytic,
//!     steepest_descent::SteepestDescentBuilder,
//! };
//!
//! fn obj_func(point: &[f64]) -> f64 {
//!     point.iter().map(|x| x.powi(2)).sum()
//! }
//!
//! fn obj_func_d(point: &[f64]) -> Vec<f64> {
//!     point.iter().map(|x| 2.0 * x).collect()
//! }
//!
//! let minimum = SteepestDescentBuilder::default()
//!     .build()
//!     .minimize(
//!         obj_func,
//!         Analytic(obj_func_d),
//!         BacktrackingLineSearch::default(),
//!         &[-10.0..=10.0, -10.0..=10.0],
//!         vec![10.0, 10.0],
//!     )
//!     .unwrap();
//! println!("{:?}", minimum.point());
//! ```

pub mod backtracking_line_search;
pub mod benchmark;
pub mod gradient;
pub mod step_length;
pub mod steepest_descent;

use std::ops::{Add, Mul};

use num_traits::real::Real;

pub use self::types::*;

/// Descend in step-direction
/// by moving `point` `step_size` length in `direction`.
pub fn descend<A>(point: &[A], step_size: StepSize<A>, direction: &[A]) -> Vec<A>
where
    A: Copy + Add<Output = A> + Mul<Output = A>,
{
    point
        .iter()
        .zip(direction)
        .map(|(x, d)| *x + step_size * *d)
        .collect()
}

pub(crate) fn infinity_norm<A>(xs: &[A]) -> A
where
    A: Real,
{
    xs.iter().fold(A::zero(), |acc, x| acc.max(x.abs()))
}

mod types {
    use std::{cmp::Ordering, ops::Mul};

    use derive_more::Display;
    use num_traits::{bounds::LowerBounded, real::Real};

    /// Multiplier for each component of a step-direction
    /// in derivative optimization.
    #[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct StepSize<A>(pub(crate) A);

    /// Error returned when 'StepSize' is given an invalid value.
    #[derive(Clone, Copy, Debug, thiserror::Error, PartialEq)]
    pub enum InvalidStepSizeError<A> {
        /// Value is NaN.
        #[error("{0} is NaN")]
        IsNan(A),
        /// Value is below lower bound.
        #[error("{0} is below lower bound")]
        TooLow(A),
    }

    impl<A> StepSize<A>
    where
        A: Real,
    {
        /// Return a new 'StepSize' if given a valid value.
        pub fn new(value: A) -> Result<Self, InvalidStepSizeError<A>> {
            match Self(value).partial_cmp(&Self::min_value()) {
                None => Err(InvalidStepSizeError::IsNan(value)),
                Some(Ordering::Less) => Err(InvalidStepSizeError::TooLow(value)),
                _ => Ok(Self(value)),
            }
        }
    }

    impl<A> StepSize<A> {
        /// Unwrap 'StepSize' into inner value.
        pub fn into_inner(self) -> A {
            self.0
        }
    }

    impl<A> LowerBounded for StepSize<A>
    where
        A: Real,
    {
        fn min_value() -> Self {
            Self(A::zero() + A::epsilon())
        }
    }

    impl<A> Mul<A> for StepSize<A>
    where
        A: Mul<Output = A>,
    {
        type Output = A;

        fn mul(self, rhs: A) -> Self::Output {
            self.0 * rhs
        }
    }
}
