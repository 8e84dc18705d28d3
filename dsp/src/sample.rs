use std::{iter::Sum, ops};

use crate::math::Real;

/// A real or complex sample that can flow through the filters, ring buffers
/// and interpolators in this crate.
pub trait Sample:
    Copy
    + ops::Add<Output = Self>
    + ops::Sub<Output = Self>
    + ops::Mul<Real, Output = Self>
    + ops::MulAssign<Real>
    + ops::Div<Real, Output = Self>
    + Sum
{
    const ZERO: Self;

    fn magnitude_squared(&self) -> Real;

    fn magnitude(&self) -> Real {
        self.magnitude_squared().sqrt()
    }

    /// Neither NaN nor infinite, in every component.
    fn is_finite(&self) -> bool;
}

impl Sample for Real {
    const ZERO: Self = 0.0;

    fn magnitude_squared(&self) -> Real {
        self * self
    }

    fn magnitude(&self) -> Real {
        self.abs()
    }

    fn is_finite(&self) -> bool {
        Real::is_finite(*self)
    }
}
