//! Fractional-delay interpolation kernels.
//!
//! A kernel turns a fractional timing offset `tau` (in samples) into a set of
//! `N` FIR taps. Convolving the most recent `N` input samples with those taps
//! estimates the underlying waveform at `group_delay() + tau` samples before
//! the newest input.

use crate::{
    math::{sinc, Real},
    ring::Ring,
    sample::Sample,
    window::Window,
};

/// A pluggable fractional-delay kernel of fixed length `N`.
pub trait Kernel<const N: usize> {
    /// Taps for the given timing offset, ordered so that `taps[j]` weights
    /// the sample `j` steps older than the newest.
    fn taps(&self, tau: Real) -> [Real; N];

    /// Integer delay, in samples, of the kernel at `tau = 0`.
    fn group_delay(&self) -> usize {
        (N - 1) / 2
    }
}

/// Windowed-sinc kernel: `taps[k] = sinc((k - (N - 1) / 2) - tau) * w[k]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowedSinc<const N: usize> {
    window: [Real; N],
}

impl<const N: usize> WindowedSinc<N> {
    pub fn new(window: Window) -> Self {
        assert!(N % 2 == 1, "windowed sinc kernel needs an odd tap count");
        Self {
            window: window.coefficients(),
        }
    }

    fn offset(k: usize) -> Real {
        k as Real - ((N - 1) / 2) as Real
    }

    /// Unit-DC-gain taps that advance the signal by `offset` samples on top
    /// of the kernel's group delay.
    pub fn delay_taps(&self, offset: Real) -> [Real; N] {
        let mut taps: [Real; N] =
            std::array::from_fn(|k| sinc(Self::offset(k) + offset) * self.window[k]);
        let gain: Real = taps.iter().sum();
        for tap in &mut taps {
            *tap /= gain;
        }
        taps
    }
}

impl WindowedSinc<5> {
    /// The five-tap square-root-Hamming kernel used by the timing loop.
    pub fn reference() -> Self {
        Self::new(Window::SqrtHamming)
    }
}

impl Default for WindowedSinc<5> {
    fn default() -> Self {
        Self::reference()
    }
}

impl<const N: usize> Kernel<N> for WindowedSinc<N> {
    fn taps(&self, tau: Real) -> [Real; N] {
        std::array::from_fn(|k| sinc(Self::offset(k) - tau) * self.window[k])
    }
}

/// Three-tap linear interpolator.
///
/// Cheap and with a narrow capture range (`|tau| <= 1`); mostly useful as a
/// baseline against the windowed sinc.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Linear;

impl Kernel<3> for Linear {
    fn taps(&self, tau: Real) -> [Real; 3] {
        [
            (-tau).max(0.0),
            1.0 - tau.abs().min(1.0),
            tau.max(0.0),
        ]
    }
}

/// Interpolated estimate from the sample window and a set of taps.
pub fn interpolate<T: Sample, const N: usize>(window: &Ring<T, N>, taps: &[Real; N]) -> T {
    window.convolve(taps)
}
