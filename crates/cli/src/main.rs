mod cli;
mod config;
mod input;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use pulsewatch_compute::{generate_mock_metrics, Pipeline};
use pulsewatch_core::config::load_dotenv;
use pulsewatch_core::{parse_metrics, DetectorConfig};

use crate::cli::{CliArgs, Command};
use crate::config::{apply_detector_args, apply_optimize_args, CliConfig};
use crate::input::read_input;

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only the JSON verdict.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    // Layering: defaults < env < config file < flags
    let mut detector = DetectorConfig::from_env();
    CliConfig::load(args.config.as_deref())
        .context("failed to load configuration")?
        .apply(&mut detector);

    match &args.command {
        Command::Anomaly(cmd) => {
            apply_detector_args(&cmd.detector, &mut detector);
            detector.validate()?;
            detector.log_summary();

            let raw = read_input(&cmd.input)?;
            let metrics = parse_metrics(&raw)?;
            let summary = Pipeline::from_config(&detector).anomaly(&metrics)?;
            emit(&summary, args.pretty)
        }
        Command::Optimize(cmd) => {
            apply_optimize_args(cmd, &mut detector);
            detector.validate()?;
            detector.log_summary();

            let metrics = match cmd.input.as_deref() {
                Some(arg) => parse_metrics(&read_input(arg)?)?,
                None => {
                    warn!(
                        samples = detector.mock_samples,
                        seed = detector.seed,
                        "no input supplied, using mock metrics"
                    );
                    generate_mock_metrics(detector.mock_samples, detector.seed)
                }
            };
            info!(rows = metrics.len(), "running optimize");

            let verdict = Pipeline::from_config(&detector)
                .with_suggestions(cmd.suggest)
                .optimize(&metrics)?;
            emit(&verdict, args.pretty)
        }
    }
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("failed to serialize verdict")?;
    println!("{out}");
    Ok(())
}
