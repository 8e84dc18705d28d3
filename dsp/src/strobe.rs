use crate::math::Real;

/// Symbol strobe generator.
///
/// An accumulator that gains one per input sample and fires each time it
/// reaches the oversampling ratio, which also need not be an integer. On
/// average this gives one strobe per `ratio` samples no matter what the
/// interpolator is doing in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strobe {
    counter: Real,
}

impl Strobe {
    pub fn new(initial: Real) -> Self {
        Self { counter: initial }
    }

    pub fn counter(&self) -> Real {
        self.counter
    }

    /// Account for one input sample. Returns `true` on a strobe.
    ///
    /// The counter is always advanced before it is tested.
    pub fn advance(&mut self, ratio: Real) -> bool {
        self.counter += 1.0;
        if self.counter >= ratio {
            self.counter -= ratio;
            true
        } else {
            false
        }
    }

    /// Move the next strobe `samples` samples earlier (positive) or later
    /// (negative).
    pub fn slip(&mut self, samples: Real) {
        self.counter += samples;
    }
}
