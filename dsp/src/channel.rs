//! Channel impairments for exercising the receiver.

use rand::Rng;
use rand_distr::{Normal, NormalError};

use crate::interpolator::WindowedSinc;
use crate::iq::IQ;
use crate::math::Real;
use crate::sample::Sample;

/// Fractional timing offset with optional clock skew.
///
/// Sample `n` of the output is the input waveform advanced by
/// `offset + skew * n` samples, on top of a fixed bulk delay of
/// [`BULK_DELAY`](Self::BULK_DELAY) samples. The fractional part is realised
/// with a five-tap windowed-sinc delay normalised to unit DC gain, the
/// integer part by indexing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingOffset {
    offset: Real,
    skew: Real,
    kernel: WindowedSinc<5>,
}

impl TimingOffset {
    pub const BULK_DELAY: usize = 2;

    pub fn new(offset: Real) -> Self {
        Self {
            offset,
            skew: 0.0,
            kernel: WindowedSinc::reference(),
        }
    }

    /// Additional advance per output sample, i.e. the relative clock error.
    pub fn with_skew(self, skew: Real) -> Self {
        Self { skew, ..self }
    }

    /// Advance, in samples, applied to output sample `n`.
    pub fn advance_at(&self, n: usize) -> Real {
        self.offset + self.skew * n as Real
    }

    pub fn apply<T: Sample>(&self, input: &[T]) -> Vec<T> {
        (0..input.len())
            .map(|n| {
                let delay = Self::BULK_DELAY as Real - self.advance_at(n);
                let whole = (delay + 0.5).floor();
                let taps = self.kernel.delay_taps(whole - delay);
                taps.iter()
                    .enumerate()
                    .filter_map(|(k, &tap)| {
                        let m = n as isize - whole as isize - (k as isize - 2);
                        usize::try_from(m)
                            .ok()
                            .and_then(|m| input.get(m))
                            .map(|&x| x * tap)
                    })
                    .sum()
            })
            .collect()
    }
}

/// Additive white Gaussian noise, `std_dev` per rail.
pub struct Awgn<R> {
    distr: Normal<Real>,
    rng: R,
}

impl<R: Rng> Awgn<R> {
    pub fn with_rng(rng: R, std_dev: Real) -> Result<Self, NormalError> {
        Ok(Self {
            distr: Normal::new(0.0, std_dev)?,
            rng,
        })
    }

    pub fn apply(&mut self, buffer: &mut [IQ]) {
        for slot in buffer {
            *slot += IQ::new(
                self.rng.sample(self.distr),
                self.rng.sample(self.distr),
            );
        }
    }
}
