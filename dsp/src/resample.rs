use crate::amplify;
use crate::filter::Fir;
use crate::math::Real;
use crate::sample::Sample;

/// Zero-stuffing interpolator followed by a shaping filter.
///
/// Each input sample is placed at the start of a block of `factor` output
/// samples, the rest of the block is zero, and the result is filtered and
/// scaled by `factor` to restore the per-symbol energy.
pub struct Upsample<T = Real> {
    factor: usize,
    filter: Fir<T>,
}

impl<T: Sample> Upsample<T> {
    pub fn new(factor: usize, filter: Fir<T>) -> Self {
        assert!(factor > 0);
        Self { factor, filter }
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn process(&mut self, input: &[T], output: &mut [T]) {
        assert_eq!(input.len() * self.factor, output.len());
        output.fill(T::ZERO);
        for (out, inp) in output.chunks_mut(self.factor).zip(input) {
            out[0] = *inp;
            self.filter.process_inplace(out);
        }
        amplify(self.factor as Real, output);
    }

    /// Allocating convenience wrapper around [`process`](Self::process).
    pub fn process_vec(&mut self, input: &[T]) -> Vec<T> {
        let mut output = vec![T::ZERO; input.len() * self.factor];
        self.process(input, &mut output);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_filter_zero_stuffs_and_scales() {
        let mut up: Upsample = Upsample::new(4, Fir::new(vec![1.0]));
        let out = up.process_vec(&[1.0, -1.0]);
        assert_eq!(out, vec![4.0, 0.0, 0.0, 0.0, -4.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn filter_state_carries_across_blocks() {
        let mut up: Upsample = Upsample::new(2, Fir::new(vec![1.0, 1.0, 1.0]));
        let out = up.process_vec(&[1.0, 1.0]);
        // Impulses at 0 and 2, each spread over three samples, then doubled.
        assert_eq!(out, vec![2.0, 2.0, 4.0, 2.0]);
    }
}
