use crate::math::{rrc, Real};
use crate::sample::Sample;

/// Streaming FIR filter, `y[n] = sum(taps[j] * x[n - j])`, starting from an
/// all-zero history.
#[derive(Debug, Clone)]
pub struct Fir<T = Real> {
    taps: Box<[Real]>,
    buffer: Box<[T]>,
    position: usize,
}

impl<T: Sample> Fir<T> {
    pub fn new(taps: impl Into<Box<[Real]>>) -> Self {
        let taps = taps.into();
        assert!(!taps.is_empty(), "FIR filter needs at least one tap");
        let buffer = vec![T::ZERO; taps.len()].into_boxed_slice();
        Self {
            taps,
            buffer,
            position: 0,
        }
    }

    /// Root-raised-cosine pulse shaping / matched filter, normalised to unit
    /// DC gain.
    ///
    /// `num_taps` is rounded up to the next odd number so the filter has an
    /// integer group delay of `num_taps / 2`.
    pub fn root_raised_cosine(num_taps: usize, rolloff: Real, sps: Real) -> Self {
        let num_taps = num_taps | 1;
        let half_width = num_taps as isize / 2;
        let mut taps: Box<[Real]> = (-half_width..=half_width)
            .map(|t| rrc(t as Real, rolloff, sps))
            .collect();
        assert_eq!(taps.len(), num_taps);

        let gain: Real = taps.iter().sum();
        for tap in taps.iter_mut() {
            *tap /= gain;
        }
        Self::new(taps)
    }

    pub fn taps(&self) -> &[Real] {
        &self.taps
    }

    /// Delay, in samples, of a symmetric filter of this length.
    pub fn group_delay(&self) -> usize {
        self.taps.len() / 2
    }

    pub fn process_sample(&mut self, sample: T) -> T {
        self.buffer[self.position] = sample;
        self.position = (self.position + 1) % self.buffer.len();
        self.buffer[self.position..]
            .iter()
            .chain(&self.buffer[..self.position])
            .zip(self.taps.iter().rev())
            .map(|(&sample, &tap)| sample * tap)
            .sum()
    }

    pub fn process_inplace(&mut self, buffer: &mut [T]) {
        for slot in buffer {
            *slot = self.process_sample(*slot);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(T::ZERO);
        self.position = 0;
    }
}
