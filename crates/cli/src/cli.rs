use clap::{Args, Parser, Subcommand};

use pulsewatch_core::ThresholdMode;

/// Batch anomaly detection over host and database metrics.
///
/// Reads a JSON array of metric objects, fits an isolation forest on the
/// batch and prints a JSON verdict on stdout.
#[derive(Parser, Debug)]
#[command(name = "pulsewatch", version, about)]
pub struct CliArgs {
    /// Path to config file (default: ~/.config/pulsewatch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Pretty-print the JSON verdict
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect anomalies on cpu and mem only
    Anomaly(AnomalyArgs),
    /// Detect anomalies on every metric and report the deviating fields
    Optimize(OptimizeArgs),
}

/// Model overrides shared by both commands.
#[derive(Args, Debug, Default)]
pub struct DetectorArgs {
    /// Expected share of anomalous rows, in (0, 0.5]
    #[arg(long)]
    pub contamination: Option<f64>,

    /// Number of isolation trees
    #[arg(long)]
    pub estimators: Option<usize>,

    /// Subsample size cap per tree
    #[arg(long)]
    pub max_samples: Option<usize>,

    /// Random seed for the forest and for mock data
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct AnomalyArgs {
    /// Metrics as a JSON string, `@path` to a file, or `-` for stdin
    pub input: String,

    #[command(flatten)]
    pub detector: DetectorArgs,
}

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Metrics as a JSON string, `@path` to a file, or `-` for stdin.
    /// Seeded mock data is used when omitted.
    pub input: Option<String>,

    /// Rows of mock data to generate when no input is given
    #[arg(long)]
    pub mock_samples: Option<usize>,

    /// Threshold policy: corrected (|median|) or as-written (signed median)
    #[arg(long, value_parser = parse_threshold_mode)]
    pub threshold_mode: Option<ThresholdMode>,

    /// Fraction of the median a deviation must exceed
    #[arg(long)]
    pub deviation_ratio: Option<f64>,

    /// Include remediation suggestions in the verdict
    #[arg(long)]
    pub suggest: bool,

    #[command(flatten)]
    pub detector: DetectorArgs,
}

fn parse_threshold_mode(s: &str) -> Result<ThresholdMode, String> {
    s.parse().map_err(|e: pulsewatch_core::PulseError| e.to_string())
}
