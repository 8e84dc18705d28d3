//! Symbol timing recovery for oversampled QPSK baseband streams.
//!
//! The core is [`timing::TimingRecovery`]: a fractional-delay interpolator, a
//! decision-directed timing error detector, a PI loop filter and a strobe
//! counter closed into one feedback loop. The remaining modules are the
//! building blocks of that loop and a small simulated link to drive it.

pub mod channel;
pub mod error;
pub mod filter;
pub mod interpolator;
pub mod iq;
pub mod loop_filter;
pub mod math;
pub mod resample;
pub mod ring;
pub mod sample;
pub mod sim;
pub mod source;
pub mod strobe;
pub mod ted;
pub mod timing;
pub mod window;

pub use error::{Error, Result};
pub use iq::IQ;
pub use loop_filter::TauBound;
pub use timing::{Config, Step, TimingRecovery, TimingState, Trace};

use crate::{math::Real, sample::Sample};

/// Amplify (or attenuate) samples by multiplying by a constant factor.
pub fn amplify<T: Sample>(factor: Real, samples: &mut [T]) {
    for sample in samples {
        *sample *= factor;
    }
}
