use crate::{math::Real, sample::Sample};

/// Fixed-size ring buffer holding the `N` most recent samples.
///
/// The buffer starts out zero-filled, so reads before `N` samples have been
/// pushed see zeros in place of the missing history. Pushing is O(1); the
/// storage never grows or shrinks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring<T, const N: usize> {
    buffer: [T; N],
    /// Slot holding the oldest sample, and the next one to be overwritten.
    position: usize,
}

impl<T: Sample, const N: usize> Ring<T, N> {
    pub fn new() -> Self {
        assert!(N > 0, "ring buffer must hold at least one sample");
        Self {
            buffer: [T::ZERO; N],
            position: 0,
        }
    }

    pub const fn len(&self) -> usize {
        N
    }

    /// Push a new sample, discarding the oldest.
    pub fn push(&mut self, sample: T) {
        self.buffer[self.position] = sample;
        self.position = (self.position + 1) % N;
    }

    /// The `index`-th sample counting from the oldest (`0`) to the newest
    /// (`N - 1`).
    pub fn get(&self, index: usize) -> T {
        assert!(index < N, "index {} out of range for ring of {}", index, N);
        self.buffer[(self.position + index) % N]
    }

    pub fn newest(&self) -> T {
        self.get(N - 1)
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.buffer[self.position..]
            .iter()
            .chain(&self.buffer[..self.position])
    }

    /// FIR output `sum(taps[j] * x[n - j])`, where `x[n]` is the newest
    /// sample; equivalently the inner product of the buffer with the
    /// reversed taps.
    pub fn convolve(&self, taps: &[Real; N]) -> T {
        self.iter()
            .zip(taps.iter().rev())
            .map(|(&sample, &tap)| sample * tap)
            .sum()
    }
}

impl<T: Sample, const N: usize> Default for Ring<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
