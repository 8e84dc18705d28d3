use crate::math::{cos, Real, TAU};

/// Window functions for tapering truncated sinc kernels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Window {
    Hamming,
    /// Element-wise square root of the Hamming window. Gentler on the outer
    /// taps, used by the short interpolation kernels.
    SqrtHamming,
}

impl Window {
    /// Value of the window at index `k` of an `len`-point window.
    pub fn at(self, k: usize, len: usize) -> Real {
        match self {
            Window::Hamming => hamming(k, len),
            Window::SqrtHamming => hamming(k, len).sqrt(),
        }
    }

    pub fn coefficients<const N: usize>(self) -> [Real; N] {
        std::array::from_fn(|k| self.at(k, N))
    }
}

fn hamming(k: usize, len: usize) -> Real {
    if len < 2 {
        return 1.0;
    }
    0.54 - 0.46 * cos(TAU * k as Real / (len - 1) as Real)
}
