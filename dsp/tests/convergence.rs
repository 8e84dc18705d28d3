use qpsk_timing_dsp::{
    channel::Awgn,
    math::Real,
    sim::Link,
    source::{Prbs, RandomSymbols},
    Config, Error, TauBound, TimingRecovery, Trace, IQ,
};
use rand::{rngs::StdRng, SeedableRng};

const SPS: usize = 4;

/// Symbols between the transmitter and the symbol the loop emits for it:
/// two filter delays, the channel bulk delay and the interpolator delay,
/// minus the sample dropped for alignment, plus the one-sample look-back of
/// the detector.
const SYMBOL_LAG: usize = 9;

fn trace(config: Config, input: &[IQ]) -> (TimingRecovery, Trace) {
    let mut timing = TimingRecovery::new(config).unwrap();
    let mut trace = Trace::new();
    timing.process_traced(input, &mut trace).unwrap();
    (timing, trace)
}

fn mean(values: &[Real]) -> Real {
    values.iter().sum::<Real>() / values.len() as Real
}

fn max_deviation(values: &[Real], target: Real) -> Real {
    values
        .iter()
        .map(|v| (v - target).abs())
        .fold(0.0, Real::max)
}

#[test]
fn half_sample_offset_is_recovered() {
    let symbols = Prbs::default().symbols(500);
    let input = Link::default().with_offset(0.5).run(&symbols);
    let (_, trace) = trace(Config::default(), &input);

    // Self-noise of the detector keeps tau moving by up to ~0.15 sample, so
    // convergence is judged on the mean after 300 symbols.
    let settled = &trace.tau[300 * SPS..];
    assert!((mean(settled) - 0.5).abs() < 0.05, "mean tau {}", mean(settled));
    assert!(max_deviation(settled, 0.5) < 0.2);
}

#[test]
fn half_sample_offset_is_recovered_for_random_data() {
    for seed in 0..8 {
        let symbols: Vec<IQ> = RandomSymbols::new(StdRng::seed_from_u64(seed))
            .take(500)
            .collect();
        let input = Link::default().with_offset(0.5).run(&symbols);
        let (_, trace) = trace(Config::default(), &input);

        let settled = &trace.tau[300 * SPS..];
        assert!(
            (mean(settled) - 0.5).abs() < 0.05,
            "seed {}: mean tau {}",
            seed,
            mean(settled)
        );
        assert!(max_deviation(settled, 0.5) < 0.3, "seed {}", seed);
    }
}

#[test]
fn zero_offset_stays_near_zero() {
    let symbols = Prbs::default().symbols(500);
    let input = Link::default().run(&symbols);
    let (timing, trace) = trace(Config::default(), &input);

    let settled = &trace.tau[200 * SPS..];
    assert!(mean(settled).abs() < 0.1, "mean tau {}", mean(settled));
    assert!(max_deviation(settled, 0.0) < 0.3);
    assert!(timing.dtau().abs() < 0.01);
}

#[test]
fn recovered_symbols_match_transmitted() {
    let symbols = Prbs::default().symbols(500);
    let input = Link::default().with_offset(0.5).run(&symbols);
    let (_, trace) = trace(Config::default(), &input);

    for j in 20..trace.symbols.len() {
        let (rx, tx) = (trace.symbols[j], symbols[j - SYMBOL_LAG]);
        assert_eq!(rx.re > 0.0, tx.re > 0.0, "symbol {}: {} vs {}", j, rx, tx);
        assert_eq!(rx.im > 0.0, tx.im > 0.0, "symbol {}: {} vs {}", j, rx, tx);
    }

    let errors: Vec<Real> = (300..500)
        .map(|j| (trace.symbols[j] - symbols[j - SYMBOL_LAG]).norm())
        .collect();
    assert!(mean(&errors) < 0.15, "{}", mean(&errors));
    assert!(max_deviation(&errors, 0.0) < 0.25);
}

#[test]
fn one_symbol_per_ratio_samples() {
    let symbols = Prbs::default().symbols(500);
    let input = Link::default().with_offset(0.5).run(&symbols);
    assert_eq!(input.len(), 1999);
    let (timing, trace) = trace(Config::default(), &input);
    assert_eq!(trace.symbols.len(), (1999 + 3) / SPS);
    assert_eq!(timing.symbols(), 500);
    assert_eq!(trace.tau.len(), input.len());
    assert_eq!(trace.dtau.len(), input.len());
}

#[test]
fn runs_are_bit_identical() {
    let symbols = Prbs::new(0x1234).symbols(400);
    let input = Link::default().with_offset(0.3).run(&symbols);
    let (_, a) = trace(Config::default(), &input);
    let (_, b) = trace(Config::default(), &input);
    assert_eq!(a, b);

    // Chunking the input does not change anything either.
    let mut timing = TimingRecovery::new(Config::default()).unwrap();
    let mut chunked = Trace::new();
    for chunk in input.chunks(37) {
        timing.process_traced(chunk, &mut chunked).unwrap();
    }
    assert_eq!(a, chunked);
}

#[test]
fn noisy_offset_is_still_recovered() {
    let symbols = Prbs::default().symbols(500);
    let link = Link::default().with_offset(0.5);
    let mut tx = link.transmit(&symbols);
    Awgn::with_rng(StdRng::seed_from_u64(2019), 0.05)
        .unwrap()
        .apply(&mut tx);
    let (_, trace) = trace(Config::default(), &link.receive(&tx));

    let settled = &trace.tau[300 * SPS..];
    assert!((mean(settled) - 0.5).abs() < 0.1, "mean tau {}", mean(settled));
    assert!(max_deviation(settled, 0.5) < 0.3);
}

#[test]
fn clock_skew_is_tracked_by_wrapping() {
    let skew = 5e-4;
    let symbols = Prbs::default().symbols(1500);
    let input = Link::default().with_skew(skew).run(&symbols);
    let (timing, trace) = trace(Config::default().with_bound(TauBound::Wrap), &input);

    assert!(timing.slips() >= 2, "slips {}", timing.slips());
    assert!(trace.tau.iter().all(|t| t.abs() <= 1.0));
    // dtau is the drift of tau per symbol.
    let rate = mean(&trace.dtau[1000 * SPS..]);
    assert!((rate - skew * SPS as Real).abs() < 4e-4, "dtau {}", rate);

    let expected = (input.len() as i64 + 3 + timing.slips()) / SPS as i64;
    assert!((trace.symbols.len() as i64 - expected).abs() <= 1);
}

#[test]
fn clamp_keeps_tau_in_range() {
    let symbols = Prbs::default().symbols(1500);
    let input = Link::default().with_skew(5e-4).run(&symbols);
    let (timing, trace) = trace(Config::default().with_bound(TauBound::Clamp(0.75)), &input);

    assert!(trace.tau.iter().all(|t| t.abs() <= 0.75));
    assert_eq!(timing.slips(), 0);
}

#[test]
fn runaway_tau_is_reported() {
    let symbols = Prbs::default().symbols(1500);
    let input = Link::default().with_skew(5e-4).run(&symbols);
    let mut timing = TimingRecovery::new(Config::default().with_divergence_limit(1.5)).unwrap();
    let mut output = Vec::new();

    match timing.process(&input, &mut output) {
        Err(Error::Diverged { index, tau, .. }) => {
            assert!(tau > 1.5);
            assert!((2500..3500).contains(&index), "index {}", index);
            // The offending sample was not committed.
            assert_eq!(timing.samples(), index);
            assert!(timing.tau() <= 1.5);
        }
        other => panic!("expected divergence, got {:?}", other),
    }
}
