mod logger;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use hound::{WavSpec, WavWriter};
use log::{debug, info, warn};
use qpsk_timing_dsp::{
    channel::Awgn,
    iq::IQ,
    math::Real,
    sim::Link,
    source::{Prbs, RandomSymbols},
    Config, Error, TauBound, TimingRecovery, Trace,
};
use rand::{rngs::StdRng, SeedableRng};

use crate::logger::ColorLogger;

/// Nominal rate written into the WAV headers.
const SAMPLE_RATE: u32 = 8000;

/// Largest transmit-to-output lag, in symbols, searched when scoring.
const MAX_LAG: usize = 32;

/// Simulate a QPSK link with a timing offset and recover the symbol timing.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Number of symbols to transmit.
    #[arg(short = 'n', long, default_value_t = 500)]
    symbols: usize,

    /// Samples per symbol.
    #[arg(long, default_value_t = 4)]
    sps: usize,

    /// Channel timing offset, in samples.
    #[arg(long, default_value_t = 0.5, allow_hyphen_values = true)]
    offset: Real,

    /// Channel clock skew, in samples per sample.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    skew: Real,

    /// Loop bandwidth.
    #[arg(long, default_value_t = 0.005)]
    alpha: Real,

    /// Root-raised-cosine excess bandwidth.
    #[arg(long, default_value_t = 0.4)]
    rolloff: Real,

    /// Length of each filter half, in symbols.
    #[arg(long, default_value_t = 4)]
    span: usize,

    /// Standard deviation of the channel noise, per rail.
    #[arg(long, default_value_t = 0.0)]
    noise: Real,

    /// Seed for the symbol source and the noise. With `--prbs` it seeds the
    /// shift register and must fit in 16 bits.
    #[arg(long)]
    seed: Option<u64>,

    /// What to do with tau as it wanders: `none`, `clamp:<limit>` or `wrap`.
    #[arg(long, default_value = "none", value_parser = parse_bound)]
    bound: TauBound,

    /// Transmit a PRBS-15 sequence instead of random symbols.
    #[arg(long)]
    prbs: bool,

    /// Directory the WAV files are written to.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn parse_bound(s: &str) -> Result<TauBound, String> {
    match s {
        "none" => Ok(TauBound::Unbounded),
        "wrap" => Ok(TauBound::Wrap),
        _ => s
            .strip_prefix("clamp:")
            .and_then(|limit| limit.parse().ok())
            .map(TauBound::Clamp)
            .ok_or_else(|| format!("expected `none`, `wrap` or `clamp:<limit>`, got `{s}`")),
    }
}

/// Loop settings from the command line, checked before anything is built
/// from them.
fn loop_config(cli: &Cli) -> Result<Config, Error> {
    let config = Config::new(cli.sps as Real, cli.alpha).with_bound(cli.bound);
    config.validate()?;
    Ok(config)
}

fn prbs_seed(seed: Option<u64>) -> anyhow::Result<u16> {
    match seed {
        Some(seed) => u16::try_from(seed)
            .with_context(|| format!("PRBS seed {seed} does not fit in 16 bits")),
        None => Ok(Prbs::DEFAULT_SEED),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    ColorLogger::new(cli.quiet, cli.verbose).init()?;
    debug!("{:?}", cli);

    let config = loop_config(&cli)?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let symbols: Vec<IQ> = if cli.prbs {
        Prbs::new(prbs_seed(cli.seed)?).symbols(cli.symbols)
    } else {
        RandomSymbols::new(&mut rng).take(cli.symbols).collect()
    };

    let link = Link {
        sps: cli.sps,
        rolloff: cli.rolloff,
        span: cli.span,
        offset: cli.offset,
        skew: cli.skew,
    };
    let mut transmitted = link.transmit(&symbols);
    if cli.noise > 0.0 {
        Awgn::with_rng(&mut rng, cli.noise)?.apply(&mut transmitted);
    }
    let received = link.receive(&transmitted);
    info!(
        "{} symbols -> {} samples (offset {}, skew {}, noise {})",
        symbols.len(),
        received.len(),
        cli.offset,
        cli.skew,
        cli.noise
    );

    let mut timing = TimingRecovery::new(config)?;
    let mut trace = Trace::new();
    // Keep whatever was recovered up to a fault so it can still be inspected.
    let outcome = timing.process_traced(&received, &mut trace);

    info!(
        "recovered {} symbols, {} slips, tau = {:.4}, dtau = {:.6}",
        trace.symbols.len(),
        timing.slips(),
        timing.tau(),
        timing.dtau()
    );
    let settled = &trace.tau[trace.tau.len() / 2..];
    if !settled.is_empty() {
        let mean = settled.iter().sum::<Real>() / settled.len() as Real;
        info!("mean tau over the second half: {:.4}", mean);
    }
    match score(&symbols, &trace.symbols) {
        Some(score) => info!(
            "lag {} symbols: mean error {:.4}, {} of {} in the wrong quadrant",
            score.lag, score.mean_error, score.wrong_quadrant, score.compared
        ),
        None => warn!("too few symbols recovered to compare against the source"),
    }

    write_outputs(&cli.output, cli.sps, &trace)?;
    outcome?;
    Ok(())
}

struct Score {
    lag: usize,
    mean_error: Real,
    wrong_quadrant: usize,
    compared: usize,
}

/// Compares the second half of the recovered stream against the source at
/// the lag that fits it best.
fn score(transmitted: &[IQ], recovered: &[IQ]) -> Option<Score> {
    let start = recovered.len() / 2;
    (0..=MAX_LAG.min(start))
        .filter_map(|lag| {
            let pairs: Vec<(IQ, IQ)> = (start..recovered.len())
                .filter_map(|j| Some((recovered[j], *transmitted.get(j - lag)?)))
                .collect();
            if pairs.is_empty() {
                return None;
            }
            let mean_error = pairs.iter().map(|(rx, tx)| (rx - tx).norm()).sum::<Real>()
                / pairs.len() as Real;
            let wrong_quadrant = pairs
                .iter()
                .filter(|(rx, tx)| (rx.re > 0.0) != (tx.re > 0.0) || (rx.im > 0.0) != (tx.im > 0.0))
                .count();
            Some(Score {
                lag,
                mean_error,
                wrong_quadrant,
                compared: pairs.len(),
            })
        })
        .min_by(|a, b| a.mean_error.total_cmp(&b.mean_error))
}

fn write_outputs(dir: &Path, sps: usize, trace: &Trace) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create `{}`", dir.display()))?;

    let symbol_rate = (SAMPLE_RATE / sps as u32).max(1);
    write_wav(
        &dir.join("symbols.wav"),
        symbol_rate,
        trace.symbols.iter().map(|s| [s.re, s.im]),
    )?;
    write_wav(
        &dir.join("interpolated.wav"),
        SAMPLE_RATE,
        trace.interpolated.iter().map(|s| [s.re, s.im]),
    )?;
    write_wav(
        &dir.join("timing.wav"),
        SAMPLE_RATE,
        trace.tau.iter().zip(&trace.dtau).map(|(&tau, &dtau)| [tau, dtau]),
    )?;
    info!("wrote symbols.wav, interpolated.wav and timing.wav to `{}`", dir.display());
    Ok(())
}

/// Two-channel 32-bit float WAV.
fn write_wav(
    path: &Path,
    sample_rate: u32,
    frames: impl Iterator<Item = [Real; 2]>,
) -> anyhow::Result<()> {
    let mut writer = WavWriter::create(
        path,
        WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        },
    )
    .with_context(|| format!("cannot create `{}`", path.display()))?;

    for frame in frames {
        for value in frame {
            writer.write_sample(value as f32)?;
        }
    }
    writer.finalize()?;
    Ok(())
}
