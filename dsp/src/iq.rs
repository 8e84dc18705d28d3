use num_complex::Complex;

use crate::{math::Real, sample::Sample};

/// Complex baseband sample, `re` is the in-phase and `im` the quadrature part.
pub type IQ = Complex<Real>;

impl Sample for IQ {
    const ZERO: Self = Complex::new(0.0, 0.0);

    fn magnitude_squared(&self) -> Real {
        self.norm_sqr()
    }

    fn magnitude(&self) -> Real {
        self.norm()
    }

    fn is_finite(&self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }
}
