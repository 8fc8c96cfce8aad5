//! Backtracking line-search step-length selection.
//!
//! Starting from an initial step-size,
//! the search repeatedly shrinks the step
//! until the Armijo sufficient-decrease condition holds,
//! capping the first trial so it stays within bounds.

use std::{fmt, iter::Sum, ops::RangeInclusive};

use num_traits::{real::Real, AsPrimitive};

use crate::{
    descend,
    step_length::{StepLength, StepLengthError, StepLengthSelector},
    StepSize,
};

pub use self::types::*;

/// Backtracking line-search configuration parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacktrackingLineSearch<A> {
    /// The sufficient decrease parameter,
    /// `c_1`.
    pub c_1: SufficientDecreaseParameter<A>,
    /// Rate to decrease step-size while line searching.
    pub backtracking_rate: BacktrackingRate<A>,
    /// Step-size to try first each search.
    pub initial_step_size: StepSize<A>,
    /// Times to decrease the step-size before giving up.
    pub max_backtracks: usize,
}

impl<A> BacktrackingLineSearch<A> {
    /// Return a new 'BacktrackingLineSearch'.
    pub fn new(
        c_1: SufficientDecreaseParameter<A>,
        backtracking_rate: BacktrackingRate<A>,
        initial_step_size: StepSize<A>,
        max_backtracks: usize,
    ) -> Self {
        Self {
            c_1,
            backtracking_rate,
            initial_step_size,
            max_backtracks,
        }
    }
}

impl<A> Default for BacktrackingLineSearch<A>
where
    A: 'static + Copy + fmt::Debug + Real,
    f64: AsPrimitive<A>,
{
    fn default() -> Self {
        Self {
            c_1: SufficientDecreaseParameter::default(),
            backtracking_rate: BacktrackingRate::default(),
            initial_step_size: StepSize::new(A::one()).unwrap(),
            max_backtracks: 40,
        }
    }
}

impl<A> StepLengthSelector<A> for BacktrackingLineSearch<A>
where
    A: 'static + Copy + Real + Sum,
{
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
        F: Fn(&[A]) -> A,
    {
        let c_1_times_derivatives_dot_direction = self.c_1
            * derivatives
                .iter()
                .zip(direction)
                .map(|(x, y)| *x * *y)
                .sum::<A>();
        let mut step_size = self.initial_step_size;
        if let Some(cap) = feasible_step_cap(point, direction, bounds) {
            if cap < step_size.into_inner() {
                step_size =
                    StepSize::new(cap).map_err(|_| StepLengthError::NoFeasibleStep {
                        point: point.to_vec(),
                    })?;
            }
        }
        let mut obj_evals = 0;
        for _ in 0..=self.max_backtracks {
            let value_at_step = f(&descend(point, step_size, direction));
            obj_evals += 1;
            if is_sufficient_decrease(
                value,
                step_size,
                c_1_times_derivatives_dot_direction,
                value_at_step,
            ) {
                return Ok(StepLength::new(step_size, obj_evals, 0));
            }
            step_size = self.backtracking_rate * step_size;
        }
        Err(StepLengthError::NoSufficientDecrease {
            backtracks: self.max_backtracks,
        })
    }
}

/// Largest step keeping `point + step * direction` within `bounds`,
/// if any bound binds.
fn feasible_step_cap<A>(
    point: &[A],
    direction: &[A],
    bounds: &[RangeInclusive<A>],
) -> Option<A>
where
    A: Copy + Real,
{
    point
        .iter()
        .zip(direction)
        .zip(bounds)
        .filter_map(|((x, d), range)| {
            if *d > A::zero() {
                Some((*range.end() - *x) / *d)
            } else if *d < A::zero() {
                Some((*range.start() - *x) / *d)
            } else {
                None
            }
        })
        .reduce(A::min)
}

/// The sufficient decrease condition,
/// also known as the Armijo rule,
/// mathematically written as:
/// $f(x_k + a_k p_k) <= f(x_k) + c_1 a_k p_k^T grad_f(x_k)$.
fn is_sufficient_decrease<A>(
    value: A,
    step_size: StepSize<A>,
    c_1_times_derivatives_dot_direction: A,
    value_at_step: A,
) -> bool
where
    A: Copy + Real,
{
    value_at_step <= value + step_size * c_1_times_derivatives_dot_direction
}

mod types {
    use std::{cmp::Ordering, ops::Mul};

    use derive_more::Display;
    use num_traits::{
        bounds::{LowerBounded, UpperBounded},
        real::Real,
        AsPrimitive,
    };

    use crate::StepSize;

    /// The sufficient decrease parameter,
    /// `c_1`.
    #[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct SufficientDecreaseParameter<A>(A);

    /// Error returned when 'SufficientDecreaseParameter' is given an invalid value.
    #[derive(Clone, Copy, Debug, thiserror::Error, PartialEq)]
    pub enum InvalidSufficientDecreaseParameterError<A> {
        /// Value is NaN.
        #[error("{0} is NaN")]
        IsNan(A),
        /// Value is below lower bound.
        #[error("{0} is below lower bound")]
        TooLow(A),
        /// Value is above upper bound.
        #[error("{0} is above upper bound")]
        TooHigh(A),
    }

    impl<A> SufficientDecreaseParameter<A>
    where
        A: Real,
    {
        /// Return a new 'SufficientDecreaseParameter' if given a valid value.
        pub fn new(value: A) -> Result<Self, InvalidSufficientDecreaseParameterError<A>> {
            match (
                Self(value).partial_cmp(&Self::min_value()),
                Self(value).partial_cmp(&Self::max_value()),
            ) {
                (None, _) | (_, None) => {
                    Err(InvalidSufficientDecreaseParameterError::IsNan(value))
                }
                (Some(Ordering::Less), _) => {
                    Err(InvalidSufficientDecreaseParameterError::TooLow(value))
                }
                (_, Some(Ordering::Greater)) => {
                    Err(InvalidSufficientDecreaseParameterError::TooHigh(value))
                }
                _ => Ok(Self(value)),
            }
        }
    }

    impl<A> SufficientDecreaseParameter<A> {
        /// Unwrap 'SufficientDecreaseParameter' into inner value.
        pub fn into_inner(self) -> A {
            self.0
        }
    }

    impl<A> Default for SufficientDecreaseParameter<A>
    where
        A: 'static + Copy,
        f64: AsPrimitive<A>,
    {
        fn default() -> Self {
            Self(0.5.as_())
        }
    }

    impl<A> LowerBounded for SufficientDecreaseParameter<A>
    where
        A: Real,
    {
        fn min_value() -> Self {
            Self(A::zero() + A::epsilon())
        }
    }

    impl<A> UpperBounded for SufficientDecreaseParameter<A>
    where
        A: Real,
    {
        fn max_value() -> Self {
            Self(A::one() - A::epsilon())
        }
    }

    impl<A> Mul<A> for SufficientDecreaseParameter<A>
    where
        A: Mul<Output = A>,
    {
        type Output = A;

        fn mul(self, rhs: A) -> Self::Output {
            self.0 * rhs
        }
    }

    /// Rate to decrease step-size while line searching.
    #[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct BacktrackingRate<A>(A);

    /// Error returned when 'BacktrackingRate' is given an invalid value.
    #[derive(Clone, Copy, Debug, thiserror::Error, PartialEq)]
    pub enum InvalidBacktrackingRateError<A> {
        /// Value is NaN.
        #[error("{0} is NaN")]
        IsNan(A),
        /// Value is below lower bound.
        #[error("{0} is below lower bound")]
        TooLow(A),
        /// Value is above upper bound.
        #[error("{0} is above upper bound")]
        TooHigh(A),
    }

    impl<A> BacktrackingRate<A>
    where
        A: Real,
    {
        /// Return a new 'BacktrackingRate' if given a valid value.
        pub fn new(value: A) -> Result<Self, InvalidBacktrackingRateError<A>> {
            match (
                Self(value).partial_cmp(&Self::min_value()),
                Self(value).partial_cmp(&Self::max_value()),
            ) {
                (None, _) | (_, None) => Err(InvalidBacktrackingRateError::IsNan(value)),
                (Some(Ordering::Less), _) => Err(InvalidBacktrackingRateError::TooLow(value)),
                (_, Some(Ordering::Greater)) => {
                    Err(InvalidBacktrackingRateError::TooHigh(value))
                }
                _ => Ok(Self(value)),
            }
        }
    }

    impl<A> BacktrackingRate<A> {
        /// Unwrap 'BacktrackingRate' into inner value.
        pub fn into_inner(self) -> A {
            self.0
        }
    }

    impl<A> Default for BacktrackingRate<A>
    where
        A: 'static + Copy,
        f64: AsPrimitive<A>,
    {
        fn default() -> Self {
            Self(0.5.as_())
        }
    }

    impl<A> LowerBounded for BacktrackingRate<A>
    where
        A: Real,
    {
        fn min_value() -> Self {
            Self(A::zero() + A::epsilon())
        }
    }

    impl<A> UpperBounded for BacktrackingRate<A>
    where
        A: Real,
    {
        fn max_value() -> Self {
            Self(A::one() - A::epsilon())
        }
    }

    impl<A> Mul<StepSize<A>> for BacktrackingRate<A>
    where
        A: Mul<Output = A>,
    {
        type Output = StepSize<A>;

        fn mul(self, rhs: StepSize<A>) -> Self::Output {
            StepSize(self.0 * rhs.0)
        }
    }
}
