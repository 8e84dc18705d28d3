//! End-to-end QPSK link used to exercise the timing loop: pulse shaping, a
//! timing offset channel and the matched filter.

use crate::channel::TimingOffset;
use crate::filter::Fir;
use crate::interpolator::{Kernel, WindowedSinc};
use crate::iq::IQ;
use crate::math::Real;
use crate::resample::Upsample;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    /// Samples per symbol.
    pub sps: usize,
    /// Excess bandwidth of the root-raised-cosine filters.
    pub rolloff: Real,
    /// Length of each filter half, in symbols.
    pub span: usize,
    /// Channel timing offset, in samples.
    pub offset: Real,
    /// Channel clock skew, in samples per sample.
    pub skew: Real,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            sps: 4,
            rolloff: 0.4,
            span: 4,
            offset: 0.0,
            skew: 0.0,
        }
    }
}

impl Link {
    pub fn with_offset(self, offset: Real) -> Self {
        Self { offset, ..self }
    }

    pub fn with_skew(self, skew: Real) -> Self {
        Self { skew, ..self }
    }

    pub fn pulse_filter(&self) -> Fir<IQ> {
        Fir::root_raised_cosine(2 * self.span * self.sps, self.rolloff, self.sps as Real)
    }

    pub fn channel(&self) -> TimingOffset {
        TimingOffset::new(self.offset).with_skew(self.skew)
    }

    /// Pulse-shaped, offset transmit samples.
    pub fn transmit(&self, symbols: &[IQ]) -> Vec<IQ> {
        let shaped = Upsample::new(self.sps, self.pulse_filter()).process_vec(symbols);
        self.channel().apply(&shaped)
    }

    /// Matched-filtered samples, ready for the timing loop.
    ///
    /// The first [`lead`](Self::lead) samples are dropped so that, with no
    /// offset, symbol peaks fall exactly where a fresh reference timing loop
    /// looks for them.
    pub fn receive(&self, samples: &[IQ]) -> Vec<IQ> {
        let mut matched = self.pulse_filter();
        let mut output = samples.to_vec();
        matched.process_inplace(&mut output);
        output.split_off(self.lead().min(output.len()))
    }

    pub fn run(&self, symbols: &[IQ]) -> Vec<IQ> {
        self.receive(&self.transmit(symbols))
    }

    /// Samples dropped by [`receive`](Self::receive).
    ///
    /// A fresh loop with group delay `d` strobes first on sample
    /// `sps - d - 2` and centres its detector one sample before that. The
    /// symbol peaks arrive after both filters, the bulk channel delay and the
    /// interpolator delay.
    pub fn lead(&self) -> usize {
        let interpolator_delay = WindowedSinc::reference().group_delay();
        let total_delay =
            2 * self.pulse_filter().group_delay() + TimingOffset::BULK_DELAY + interpolator_delay;
        (total_delay + interpolator_delay + 3) % self.sps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Prbs;

    #[test]
    fn reference_link_drops_one_sample() {
        assert_eq!(Link::default().lead(), 1);
    }

    #[test]
    fn run_keeps_length_minus_lead() {
        let symbols = Prbs::default().symbols(50);
        let link = Link::default().with_offset(0.5);
        assert_eq!(link.run(&symbols).len(), 50 * 4 - 1);
    }

    #[test]
    fn zero_offset_peaks_on_the_symbol_grid() {
        let symbols = Prbs::default().symbols(200);
        let link = Link::default();
        let rx = link.run(&symbols);
        // Detector centre for strobe k is sample 4k - 1 of the aligned
        // stream; the interpolator adds two more samples of delay.
        let delay = 2 * link.pulse_filter().group_delay() + TimingOffset::BULK_DELAY - link.lead();
        for (k, &symbol) in symbols.iter().enumerate().take(150).skip(10) {
            let sample = rx[4 * k + delay];
            assert!((sample - symbol).norm() < 0.1, "symbol {}: {} vs {}", k, sample, symbol);
        }
    }
}
