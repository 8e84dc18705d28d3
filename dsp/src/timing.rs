//! Closed-loop symbol timing recovery.
//!
//! Every input sample goes through the same fixed sequence:
//!
//! 1. push the sample into the interpolator window,
//! 2. interpolate at the current `tau`,
//! 3. push the interpolated sample into the derivative estimator,
//! 4. advance the strobe counter,
//! 5. on a strobe: compute the timing error, update `dtau` then `tau`, and
//!    emit the symbol under the detector,
//! 6. drift `tau` by `dtau / ratio`,
//! 7. apply the `tau` bound policy.
//!
//! The order matters. Sample `n` is interpolated with the `tau` left behind
//! by sample `n - 1`, so the loop cannot be split across samples, and moving
//! the drift before the strobe update changes how the loop converges.

use log::{debug, trace, warn};

use crate::{
    error::{Error, Result},
    interpolator::{interpolate, Kernel, WindowedSinc},
    iq::IQ,
    loop_filter::{LoopConstants, LoopFilter, TauBound},
    math::Real,
    ring::Ring,
    strobe::Strobe,
    ted::{self, Derivative},
};

/// Session-wide settings of a timing loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Input samples per symbol.
    pub oversampling_ratio: Real,
    /// Loop bandwidth. The phase gain is derived from it, see
    /// [`LoopConstants::critically_damped`].
    pub alpha: Real,
    pub bound: TauBound,
    /// Report [`Error::Diverged`] once `|tau|` grows past this many samples.
    pub divergence_limit: Option<Real>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oversampling_ratio: 4.0,
            alpha: 0.005,
            bound: TauBound::Unbounded,
            divergence_limit: None,
        }
    }
}

impl Config {
    pub fn new(oversampling_ratio: Real, alpha: Real) -> Self {
        Self {
            oversampling_ratio,
            alpha,
            ..Self::default()
        }
    }

    pub fn with_bound(self, bound: TauBound) -> Self {
        Self { bound, ..self }
    }

    pub fn with_divergence_limit(self, limit: Real) -> Self {
        Self {
            divergence_limit: Some(limit),
            ..self
        }
    }

    pub fn constants(&self) -> LoopConstants {
        LoopConstants::critically_damped(self.alpha)
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = self.oversampling_ratio;
        if !(ratio.is_finite() && ratio >= 2.0) {
            return Err(Error::InvalidRatio(ratio));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::InvalidBandwidth(self.alpha));
        }
        let limits = match self.bound {
            TauBound::Clamp(limit) => Some(limit),
            _ => None,
        };
        for limit in limits.into_iter().chain(self.divergence_limit) {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(Error::InvalidLimit(limit));
            }
        }
        Ok(())
    }
}

/// Complete mutable state of one timing loop.
///
/// This is a plain value: [`step`] takes one and returns its successor, so a
/// failed step simply leaves the previous state untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingState<const N: usize = 5> {
    filter: LoopFilter,
    strobe: Strobe,
    window: Ring<IQ, N>,
    derivative: Derivative,
    samples: u64,
}

impl<const N: usize> TimingState<N> {
    /// Fresh state for a kernel with the given group delay: zero estimates,
    /// zero-filled buffers, and the strobe counter at `group_delay + 1`.
    pub fn new(group_delay: usize) -> Self {
        Self {
            filter: LoopFilter::new(),
            strobe: Strobe::new((group_delay + 1) as Real),
            window: Ring::new(),
            derivative: Derivative::new(),
            samples: 0,
        }
    }

    pub fn tau(&self) -> Real {
        self.filter.tau
    }

    pub fn dtau(&self) -> Real {
        self.filter.dtau
    }

    pub fn counter(&self) -> Real {
        self.strobe.counter()
    }

    /// Number of samples consumed so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn window(&self) -> &Ring<IQ, N> {
        &self.window
    }

    pub fn derivative(&self) -> &Derivative {
        &self.derivative
    }
}

/// Everything one input sample produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub interpolated: IQ,
    /// Recovered symbol, on strobe cycles only.
    pub symbol: Option<IQ>,
    /// Timing error, on strobe cycles only.
    pub error: Option<Real>,
    /// `tau` after this sample.
    pub tau: Real,
    /// `dtau` after this sample.
    pub dtau: Real,
    /// Strobe slip applied by [`TauBound::Wrap`], in samples.
    pub slip: i8,
}

/// Advance the loop by one input sample.
///
/// Pure: `state` is left as it was, and on error no successor is produced.
pub fn step<K: Kernel<N>, const N: usize>(
    config: &Config,
    constants: &LoopConstants,
    kernel: &K,
    state: &TimingState<N>,
    sample: IQ,
) -> Result<(TimingState<N>, Step)> {
    let index = state.samples;
    if !sample.is_finite() {
        return Err(Error::NonFiniteSample { index });
    }

    let mut next = *state;
    next.window.push(sample);
    let interpolated = interpolate(&next.window, &kernel.taps(next.filter.tau));
    next.derivative.push(interpolated);

    let mut symbol = None;
    let mut error = None;
    if next.strobe.advance(config.oversampling_ratio) {
        let e = ted::detect(next.derivative.derivative(), next.derivative.previous());
        next.filter.update(constants, e);
        symbol = Some(next.derivative.previous());
        error = Some(e);
    }

    next.filter.drift(config.oversampling_ratio);
    let slip = next.filter.bound(config.bound);
    if slip != 0 {
        next.strobe.slip(Real::from(slip));
    }

    if !(next.filter.is_finite() && interpolated.is_finite()) {
        return Err(Error::NumericalFault { index });
    }
    if let Some(limit) = config.divergence_limit {
        if next.filter.tau.abs() > limit {
            return Err(Error::Diverged {
                index,
                tau: next.filter.tau,
                dtau: next.filter.dtau,
            });
        }
    }

    next.samples += 1;
    let step = Step {
        interpolated,
        symbol,
        error,
        tau: next.filter.tau,
        dtau: next.filter.dtau,
        slip,
    };
    Ok((next, step))
}

/// Per-sample and per-symbol diagnostics collected by
/// [`TimingRecovery::process_traced`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    /// Recovered symbols.
    pub symbols: Vec<IQ>,
    /// Timing error at each symbol.
    pub errors: Vec<Real>,
    /// Interpolator output at each input sample.
    pub interpolated: Vec<IQ>,
    /// `tau` after each input sample.
    pub tau: Vec<Real>,
    /// `dtau` after each input sample.
    pub dtau: Vec<Real>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, step: &Step) {
        if let Some(symbol) = step.symbol {
            self.symbols.push(symbol);
        }
        if let Some(error) = step.error {
            self.errors.push(error);
        }
        self.interpolated.push(step.interpolated);
        self.tau.push(step.tau);
        self.dtau.push(step.dtau);
    }
}

/// A timing loop for one receiver session.
pub struct TimingRecovery<K = WindowedSinc<5>, const N: usize = 5> {
    config: Config,
    constants: LoopConstants,
    kernel: K,
    state: TimingState<N>,
    symbols: u64,
    slips: i64,
}

impl TimingRecovery {
    /// Timing loop with the reference five-tap windowed-sinc interpolator.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_kernel(config, WindowedSinc::reference())
    }
}

impl<K: Kernel<N>, const N: usize> TimingRecovery<K, N> {
    pub fn with_kernel(config: Config, kernel: K) -> Result<Self> {
        config.validate()?;
        let constants = config.constants();
        debug!(
            "timing loop: {} samples/symbol, {} taps, alpha {}, beta {}, bound {:?}",
            config.oversampling_ratio, N, constants.alpha, constants.beta, config.bound
        );
        let state = TimingState::new(kernel.group_delay());
        Ok(Self {
            config,
            constants,
            kernel,
            state,
            symbols: 0,
            slips: 0,
        })
    }

    /// Feed one sample, returning everything it produced.
    ///
    /// On error the loop keeps the state it had before `sample`.
    pub fn advance(&mut self, sample: IQ) -> Result<Step> {
        match step(
            &self.config,
            &self.constants,
            &self.kernel,
            &self.state,
            sample,
        ) {
            Ok((next, step)) => {
                self.state = next;
                if step.symbol.is_some() {
                    self.symbols += 1;
                }
                if step.slip != 0 {
                    self.slips += i64::from(step.slip);
                    trace!(
                        "strobe slipped {} sample(s) at sample {}, tau now {}",
                        step.slip,
                        self.state.samples - 1,
                        step.tau
                    );
                }
                Ok(step)
            }
            Err(err) => {
                warn!("{}", err);
                Err(err)
            }
        }
    }

    /// Feed one sample, returning the recovered symbol on strobe cycles.
    pub fn process_sample(&mut self, sample: IQ) -> Result<Option<IQ>> {
        Ok(self.advance(sample)?.symbol)
    }

    /// Feed a block of samples, appending recovered symbols to `output`.
    ///
    /// Returns the number of symbols appended. Processing stops at the first
    /// error; symbols recovered before it are kept in `output`.
    pub fn process(&mut self, input: &[IQ], output: &mut Vec<IQ>) -> Result<usize> {
        let start = output.len();
        for &sample in input {
            if let Some(symbol) = self.process_sample(sample)? {
                output.push(symbol);
            }
        }
        Ok(output.len() - start)
    }

    /// Like [`process`](Self::process), recording diagnostics into `trace`.
    pub fn process_traced(&mut self, input: &[IQ], trace: &mut Trace) -> Result<usize> {
        let start = trace.symbols.len();
        for &sample in input {
            let step = self.advance(sample)?;
            trace.record(&step);
        }
        Ok(trace.symbols.len() - start)
    }

    /// Return to the freshly constructed state.
    pub fn reset(&mut self) {
        debug!("timing loop reset after {} samples", self.state.samples);
        self.state = TimingState::new(self.kernel.group_delay());
        self.symbols = 0;
        self.slips = 0;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn constants(&self) -> &LoopConstants {
        &self.constants
    }

    pub fn state(&self) -> &TimingState<N> {
        &self.state
    }

    pub fn tau(&self) -> Real {
        self.state.tau()
    }

    pub fn dtau(&self) -> Real {
        self.state.dtau()
    }

    /// Samples consumed since construction or the last reset.
    pub fn samples(&self) -> u64 {
        self.state.samples
    }

    /// Symbols emitted since construction or the last reset.
    pub fn symbols(&self) -> u64 {
        self.symbols
    }

    /// Net strobe slip, in samples, from the wrap policy.
    pub fn slips(&self) -> i64 {
        self.slips
    }
}
