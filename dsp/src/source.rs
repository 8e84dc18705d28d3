//! QPSK symbol sources.

use rand::Rng;

use crate::iq::IQ;
use crate::math::FRAC_1_SQRT_2;

/// Gray-coded, unit-energy QPSK mapping. A `true` bit maps to the negative
/// half of its rail.
pub fn qpsk(i: bool, q: bool) -> IQ {
    let rail = |bit: bool| if bit { -FRAC_1_SQRT_2 } else { FRAC_1_SQRT_2 };
    IQ::new(rail(i), rail(q))
}

/// PRBS-15 generator (`x^15 + x^14 + 1`).
///
/// Deterministic and balanced, which makes runs reproducible without
/// depending on a particular random number generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prbs {
    state: u16,
}

impl Prbs {
    pub const DEFAULT_SEED: u16 = 0x7fff;
    pub const PERIOD: usize = 32767;

    /// Only the low 15 bits of `seed` are used; an all-zero seed would lock
    /// the register up, so it is replaced by `1`.
    pub fn new(seed: u16) -> Self {
        let state = seed & 0x7fff;
        Self {
            state: if state == 0 { 1 } else { state },
        }
    }

    pub fn next_bit(&mut self) -> bool {
        let bit = ((self.state >> 14) ^ (self.state >> 13)) & 1;
        self.state = ((self.state << 1) | bit) & 0x7fff;
        bit == 1
    }

    /// Next QPSK symbol, in-phase bit first.
    pub fn next_symbol(&mut self) -> IQ {
        let i = self.next_bit();
        let q = self.next_bit();
        qpsk(i, q)
    }

    pub fn symbols(&mut self, count: usize) -> Vec<IQ> {
        (0..count).map(|_| self.next_symbol()).collect()
    }
}

impl Default for Prbs {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

impl Iterator for Prbs {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        Some(self.next_bit())
    }
}

/// Endless stream of uniformly random QPSK symbols.
pub struct RandomSymbols<R> {
    rng: R,
}

impl<R: Rng> RandomSymbols<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Iterator for RandomSymbols<R> {
    type Item = IQ;

    fn next(&mut self) -> Option<IQ> {
        Some(qpsk(self.rng.gen(), self.rng.gen()))
    }
}
