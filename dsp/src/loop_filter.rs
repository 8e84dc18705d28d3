//! Proportional-integral loop filter for the timing loop.

use crate::math::Real;

/// Gains of the loop filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopConstants {
    /// Rate (integral) gain.
    pub alpha: Real,
    /// Phase (proportional) gain.
    pub beta: Real,
}

impl LoopConstants {
    /// Critically damped second-order loop: `beta = 2 * sqrt(alpha)`.
    pub fn critically_damped(alpha: Real) -> Self {
        Self {
            alpha,
            beta: 2.0 * alpha.sqrt(),
        }
    }
}

/// What to do with `tau` once it wanders away from zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum TauBound {
    /// Leave `tau` alone. Under a sustained rate offset it eventually leaves
    /// the support of the interpolation kernel.
    #[default]
    Unbounded,
    /// Saturate `tau` to `[-limit, limit]`. `dtau` is not touched.
    Clamp(Real),
    /// Whenever `|tau|` exceeds one sample, step it one sample back towards
    /// zero and slip the strobe by the same amount.
    Wrap,
}

/// Wrap threshold, in samples.
pub const WRAP_LIMIT: Real = 1.0;

/// Phase (`tau`) and rate (`dtau`) estimates of the timing loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopFilter {
    pub tau: Real,
    pub dtau: Real,
}

impl LoopFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strobe update. The rate estimate moves first, then the phase, both
    /// from the same error value.
    pub fn update(&mut self, constants: &LoopConstants, error: Real) {
        self.dtau += constants.alpha * error;
        self.tau += constants.beta * error;
    }

    /// Per-sample drift of the phase estimate by the current rate estimate.
    pub fn drift(&mut self, ratio: Real) {
        self.tau += self.dtau / ratio;
    }

    /// Apply the bound policy. Returns the strobe slip, in samples, that
    /// keeps the strobe aligned with the symbol grid (only non-zero for
    /// [`TauBound::Wrap`]).
    pub fn bound(&mut self, policy: TauBound) -> i8 {
        match policy {
            TauBound::Unbounded => 0,
            TauBound::Clamp(limit) => {
                self.tau = self.tau.clamp(-limit, limit);
                0
            }
            TauBound::Wrap => {
                if self.tau > WRAP_LIMIT {
                    self.tau -= 1.0;
                    1
                } else if self.tau < -WRAP_LIMIT {
                    self.tau += 1.0;
                    -1
                } else {
                    0
                }
            }
        }
    }

    pub fn is_finite(&self) -> bool {
        self.tau.is_finite() && self.dtau.is_finite()
    }
}
