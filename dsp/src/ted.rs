//! Decision-directed timing error detector.
//!
//! The detector looks at three consecutive interpolator outputs. The slope
//! across the outer two, correlated with the middle one, tells whether the
//! middle sample sits before or after the peak of its symbol pulse:
//!
//! ```txt
//!        early            on time            late
//!          x                 x                 x
//!        x                 x   x                 x
//!      x                                           x
//!   slope > 0         slope == 0          slope < 0
//! ```
//!
//! The raw product is passed through `tanh` so a single outlier cannot kick
//! the loop by more than one unit of error.

use crate::{iq::IQ, math::Real, ring::Ring};

/// Centered-difference slope estimator over the three most recent
/// interpolator outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Derivative {
    history: Ring<IQ, 3>,
}

impl Derivative {
    pub fn new() -> Self {
        Self {
            history: Ring::new(),
        }
    }

    pub fn push(&mut self, interpolated: IQ) {
        self.history.push(interpolated);
    }

    /// `oldest - newest`; positive when the waveform is falling.
    pub fn derivative(&self) -> IQ {
        self.history.get(0) - self.history.get(2)
    }

    /// The output preceding the newest one, at the center of the slope.
    pub fn previous(&self) -> IQ {
        self.history.get(1)
    }

}

/// Timing error for one strobe: `tanh(Re(derivative * conj(previous)))`.
///
/// Always within `[-1, 1]` for finite input; NaN only propagates from NaN
/// input.
pub fn detect(derivative: IQ, previous: IQ) -> Real {
    let product = (derivative * previous.conj()).re;
    if !product.is_nan() {
        return product.tanh();
    }
    // The two partial products overflowed with opposite signs. Normalise
    // both operands so the sum is exact, then scale back; an overflow there
    // saturates to the right sign.
    let (dm, pm) = (peak(derivative), peak(previous));
    let scaled = ((derivative / dm) * (previous / pm).conj()).re;
    (scaled * dm * pm).tanh()
}

fn peak(x: IQ) -> Real {
    x.re.abs().max(x.im.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn derivative_uses_fixed_sign_convention() {
        let mut d = Derivative::new();
        d.push(IQ::new(1.0, 0.0));
        d.push(IQ::new(2.0, 0.0));
        d.push(IQ::new(3.0, 1.0));
        assert_eq!(d.derivative(), IQ::new(-2.0, -1.0));
        assert_eq!(d.previous(), IQ::new(2.0, 0.0));
    }

    #[test]
    fn symmetric_peak_gives_no_error() {
        let mut d = Derivative::new();
        for x in [0.5, 1.0, 0.5] {
            d.push(IQ::new(x, -x));
        }
        assert_eq!(detect(d.derivative(), d.previous()), 0.0);
    }

    #[test]
    fn error_sign_follows_slope() {
        let mut rising = Derivative::new();
        for x in [0.2, 0.6, 0.9] {
            rising.push(IQ::new(x, x));
        }
        // Still climbing towards the peak: sampling early.
        assert!(detect(rising.derivative(), rising.previous()) < 0.0);

        let mut falling = Derivative::new();
        for x in [0.9, 0.6, 0.2] {
            falling.push(IQ::new(-x, -x));
        }
        assert!(detect(falling.derivative(), falling.previous()) > 0.0);
    }

    #[test]
    fn output_is_bounded_for_any_finite_input() {
        let mut rng = StdRng::seed_from_u64(0x7ed);
        for _ in 0..10_000 {
            let scale = 10f64.powi(rng.gen_range(-6..=307));
            let mut sample = || {
                IQ::new(
                    rng.gen_range(-1.0..1.0) * scale,
                    rng.gen_range(-1.0..1.0) * scale,
                )
            };
            let (derivative, previous) = (sample(), sample());
            let e = detect(derivative, previous);
            assert!((-1.0..=1.0).contains(&e), "{e} from {derivative} {previous}");
        }
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let huge = IQ::new(1e300, 1e300);
        assert_eq!(detect(huge, huge), 1.0);
        assert_eq!(detect(-huge, huge), -1.0);
    }

    #[test]
    fn cancelling_overflow_is_not_nan() {
        // Both partial products overflow, with opposite signs.
        let e = detect(IQ::new(1e300, 1e300), IQ::new(1e300, -1e300));
        assert_eq!(e, 0.0);

        let e = detect(IQ::new(1e300, 2e300), IQ::new(1e300, -1e300));
        assert_eq!(e, -1.0);

        let max = Real::MAX;
        let e = detect(IQ::new(max, -max), IQ::new(-max, -max));
        assert_eq!(e, 0.0);
        let e = detect(IQ::new(max, -0.5 * max), IQ::new(max, max));
        assert_eq!(e, 1.0);
    }
}
