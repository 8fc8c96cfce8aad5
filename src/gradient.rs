//! Gradient oracles
//! supplying partial derivatives of an objective function.

use num_traits::real::Real;

pub use self::types::*;

/// A component for computing partial derivatives
/// of an objective function at a point.
pub trait GradientOracle<A> {
    /// Return partial derivatives of `f` at `point`,
    /// one per dimension of `point`.
    fn gradient<F>(&self, f: &F, point: &[A]) -> Vec<A>
    where
        F: Fn(&[A]) -> A;
}

/// An oracle delegating to a hand-derived gradient function,
/// ignoring the objective.
#[derive(Clone, Copy, Debug)]
pub struct Analytic<FD>(pub FD);

impl<A, FD> GradientOracle<A> for Analytic<FD>
where
    FD: Fn(&[A]) -> Vec<A>,
{
    fn gradient<F>(&self, _f: &F, point: &[A]) -> Vec<A>
    where
        F: Fn(&[A]) -> A,
    {
        (self.0)(point)
    }
}

/// An oracle approximating partial derivatives
/// with central finite-differences,
/// `(f(x + h e_i) - f(x - h e_i)) / 2h` per dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CentralDifference<A> {
    /// Half-width `h` of the difference stencil.
    pub interval: DifferenceInterval<A>,
}

impl<A> CentralDifference<A> {
    /// Return a new 'CentralDifference'.
    pub fn new(interval: DifferenceInterval<A>) -> Self {
        Self { interval }
    }
}

impl<A> Default for CentralDifference<A>
where
    A: Real,
{
    fn default() -> Self {
        Self {
            interval: DifferenceInterval::default(),
        }
    }
}

impl<A> GradientOracle<A> for CentralDifference<A>
where
    A: Real,
{
    fn gradient<F>(&self, f: &F, point: &[A]) -> Vec<A>
    where
        F: Fn(&[A]) -> A,
    {
        let h = self.interval.into_inner();
        (0..point.len())
            .map(|i| {
                let mut forward = point.to_vec();
                forward[i] = forward[i] + h;
                let mut backward = point.to_vec();
                backward[i] = backward[i] - h;
                (f(&forward) - f(&backward)) / (h + h)
            })
            .collect()
    }
}

mod types {
    use std::cmp::Ordering;

    use derive_more::Display;
    use num_traits::{bounds::LowerBounded, real::Real};

    /// Half-width of a finite-difference stencil.
    #[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct DifferenceInterval<A>(A);

    /// Error returned when 'DifferenceInterval' is given an invalid value.
    #[derive(Clone, Copy, Debug, thiserror::Error, PartialEq)]
    pub enum InvalidDifferenceIntervalError<A> {
        /// Value is NaN.
        #[error("{0} is NaN")]
        IsNan(A),
        /// Value is below lower bound.
        #[error("{0} is below lower bound")]
        TooLow(A),
    }

    impl<A> DifferenceInterval<A>
    where
        A: Real,
    {
        /// Return a new 'DifferenceInterval' if given a valid value.
        pub fn new(value: A) -> Result<Self, InvalidDifferenceIntervalError<A>> {
            match Self(value).partial_cmp(&Self::min_value()) {
                None => Err(InvalidDifferenceIntervalError::IsNan(value)),
                Some(Ordering::Less) => Err(InvalidDifferenceIntervalError::TooLow(value)),
                _ => Ok(Self(value)),
            }
        }
    }

    impl<A> DifferenceInterval<A> {
        /// Unwrap 'DifferenceInterval' into inner value.
        pub fn into_inner(self) -> A {
            self.0
        }
    }

    impl<A> Default for DifferenceInterval<A>
    where
        A: Real,
    {
        fn default() -> Self {
            Self(A::epsilon().cbrt())
        }
    }

    impl<A> LowerBounded for DifferenceInterval<A>
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

    use crate::benchmark::{branin, branin_d};

    use super::*;

    #[test]
    fn analytic_should_delegate_to_the_gradient_function() {
        let derivatives =
            Analytic(branin_d).gradient(&branin, &[2.5, 7.5]);
        assert_eq!(derivatives, branin_d(&[2.5, 7.5]));
    }

    #[test]
    fn central_difference_should_agree_with_the_analytic_gradient() {
        for point in [[2.5, 7.5], [-3.0, 12.0], [9.0, 3.0]] {
            let approximated = CentralDifference::default().gradient(&branin, &point);
            let exact = branin_d(&point);
            for (approximated, exact) in approximated.iter().zip(&exact) {
                assert_relative_eq!(*approximated, *exact, max_relative = 1e-5, epsilon = 1e-5);
            }
        }
    }
}
