//! MerjEQ Probe
//!
//! Offline frequency response measurement: drives test tones through a
//! freshly prepared EQ processor and reports measured against analytic gain.

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use merj_core::{AudioProcessor, EqProcessor, EqState, ParameterId, StreamConfig};
use merj_dsp::analysis::measure_tone;

const DEFAULT_FREQUENCIES: [f32; 6] = [50.0, 200.0, 1000.0, 4000.0, 12000.0, 18000.0];

#[derive(Parser)]
#[command(name = "merj-probe")]
#[command(about = "Measure the frequency response of the MerjEQ engine", long_about = None)]
struct Cli {
    /// Sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Low shelf gain (dB, 200 Hz)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    low: f32,

    /// Peak gain (dB, 4 kHz)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    mid: f32,

    /// High shelf gain (dB, 12 kHz)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    high: f32,

    /// Peak band Q
    #[arg(long, default_value_t = 1.0)]
    q: f32,

    /// Enable the tanh output stage
    #[arg(long)]
    saturation: bool,

    /// Test frequency in Hz (repeatable)
    #[arg(long = "freq")]
    frequencies: Vec<f32>,

    /// Test tone amplitude
    #[arg(long, default_value_t = 0.5)]
    amplitude: f32,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct ProbeRow {
    frequency_hz: f32,
    measured_db: f32,
    analytic_db: f32,
    peak: f32,
}

#[derive(Debug, Serialize)]
struct ProbeReport {
    sample_rate: u32,
    settings: EqState,
    results: Vec<ProbeRow>,
}

impl Cli {
    fn apply_settings(&self, processor: &EqProcessor) {
        let params = processor.parameters();
        params.set(ParameterId::LowGain, self.low);
        params.set(ParameterId::MidGain, self.mid);
        params.set(ParameterId::HighGain, self.high);
        params.set(ParameterId::MidQ, self.q);
        params.set_saturation_enabled(self.saturation);
    }

    fn frequencies(&self) -> Vec<f32> {
        if self.frequencies.is_empty() {
            DEFAULT_FREQUENCIES.to_vec()
        } else {
            self.frequencies.clone()
        }
    }
}

/// Measure one tone through a processor that has never seen audio
fn probe(cli: &Cli, config: &StreamConfig, frequency: f32) -> anyhow::Result<ProbeRow> {
    let mut processor = EqProcessor::new();
    processor
        .prepare(config)
        .context("failed to prepare processor")?;
    cli.apply_settings(&processor);

    let measurement = measure_tone(
        |input| {
            let mut frame = [input];
            let result = processor.process_block(&mut [&mut frame[..]], 1);
            if result.is_ok() {
                frame[0]
            } else {
                0.0
            }
        },
        frequency,
        config.sample_rate as f32,
        cli.amplitude,
    );

    let row = ProbeRow {
        frequency_hz: frequency,
        measured_db: measurement.gain_db,
        analytic_db: processor.chain().magnitude_db(frequency),
        peak: measurement.peak,
    };
    debug!("{:?}", row);
    Ok(row)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "merj=debug" } else { "merj=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if !(cli.amplitude.is_finite() && cli.amplitude > 0.0) {
        bail!("amplitude must be positive, got {}", cli.amplitude);
    }

    let config = StreamConfig::new(cli.sample_rate, 1, 512);
    config.validate().context("invalid sample rate")?;

    let nyquist = cli.sample_rate as f32 / 2.0;
    let frequencies = cli.frequencies();
    if let Some(bad) = frequencies
        .iter()
        .find(|&&f| !(f.is_finite() && f > 0.0 && f < nyquist))
    {
        bail!("test frequency {} Hz must lie between 0 and {} Hz", bad, nyquist);
    }

    info!(
        "Probing {} frequencies at {} Hz",
        frequencies.len(),
        cli.sample_rate
    );

    let results = frequencies
        .iter()
        .map(|&frequency| probe(&cli, &config, frequency))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let settings = {
        let processor = EqProcessor::new();
        cli.apply_settings(&processor);
        EqState::capture(&processor.parameters())
    };

    if cli.json {
        let report = ProbeReport {
            sample_rate: cli.sample_rate,
            settings,
            results,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "low {:+.1} dB | mid {:+.1} dB (Q {:.2}) | high {:+.1} dB | saturation {}",
            settings.low_gain_db,
            settings.mid_gain_db,
            settings.mid_q,
            settings.high_gain_db,
            if settings.saturation_enabled { "on" } else { "off" }
        );
        println!("{:>10}  {:>12}  {:>12}  {:>8}", "freq (Hz)", "measured dB", "analytic dB", "peak");
        for row in &results {
            println!(
                "{:>10.1}  {:>12.3}  {:>12.3}  {:>8.4}",
                row.frequency_hz, row.measured_db, row.analytic_db, row.peak
            );
        }
    }

    Ok(())
}
