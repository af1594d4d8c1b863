use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PulseError, Result};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

const ENV_PREFIX: &str = "PULSEWATCH";

fn env_opt(key: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{key}"))
        .ok()
        .filter(|s| !s.is_empty())
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(
                key = %format!("{ENV_PREFIX}_{key}"),
                value = %raw,
                "ignoring unparsable setting"
            );
            default
        }),
        None => default,
    }
}

// ── Threshold policy ──────────────────────────────────────────

/// How the per-field deviation threshold is derived from the median.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdMode {
    /// `|median| * ratio`
    #[default]
    Corrected,
    /// `median * ratio`, sign kept. A negative median yields a negative
    /// threshold, so every deviation on that field counts.
    AsWritten,
}

impl ThresholdMode {
    pub fn threshold(self, median: f64, ratio: f64) -> f64 {
        match self {
            ThresholdMode::Corrected => median.abs() * ratio,
            ThresholdMode::AsWritten => median * ratio,
        }
    }
}

impl FromStr for ThresholdMode {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "corrected" => Ok(ThresholdMode::Corrected),
            "as-written" | "as_written" => Ok(ThresholdMode::AsWritten),
            other => Err(PulseError::InvalidConfig(format!(
                "unknown threshold mode '{other}' (expected 'corrected' or 'as-written')"
            ))),
        }
    }
}

impl fmt::Display for ThresholdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdMode::Corrected => f.write_str("corrected"),
            ThresholdMode::AsWritten => f.write_str("as-written"),
        }
    }
}

// ── Detector ──────────────────────────────────────────────────

/// Everything a single detection run is parameterised by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Expected share of anomalous rows, in `(0, 0.5]`.
    pub contamination: f64,
    /// Number of isolation trees.
    pub n_estimators: usize,
    /// Subsample size cap per tree.
    pub max_samples: usize,
    /// Seed for the forest and for mock data.
    pub seed: u64,
    /// Rows generated when no input is supplied.
    pub mock_samples: usize,
    pub threshold_mode: ThresholdMode,
    /// Fraction of the median a delta must exceed to flag a field.
    pub deviation_ratio: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            contamination: 0.1,
            n_estimators: 100,
            max_samples: 256,
            seed: 42,
            mock_samples: 100,
            threshold_mode: ThresholdMode::Corrected,
            deviation_ratio: 0.5,
        }
    }
}

impl DetectorConfig {
    /// Build config from `PULSEWATCH_*` environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self::from_lookup(env_opt)
    }

    /// Build config from an arbitrary key lookup. Keys are unprefixed, e.g. `SEED`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            contamination: parsed(&lookup, "CONTAMINATION", d.contamination),
            n_estimators: parsed(&lookup, "ESTIMATORS", d.n_estimators),
            max_samples: parsed(&lookup, "MAX_SAMPLES", d.max_samples),
            seed: parsed(&lookup, "SEED", d.seed),
            mock_samples: parsed(&lookup, "MOCK_SAMPLES", d.mock_samples),
            threshold_mode: parsed(&lookup, "THRESHOLD_MODE", d.threshold_mode),
            deviation_ratio: parsed(&lookup, "DEVIATION_RATIO", d.deviation_ratio),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(PulseError::InvalidConfig(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        if self.n_estimators == 0 {
            return Err(PulseError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.max_samples < 2 {
            return Err(PulseError::InvalidConfig(format!(
                "max_samples must be at least 2, got {}",
                self.max_samples
            )));
        }
        if !(self.deviation_ratio.is_finite() && self.deviation_ratio > 0.0) {
            return Err(PulseError::InvalidConfig(format!(
                "deviation_ratio must be a positive number, got {}",
                self.deviation_ratio
            )));
        }
        Ok(())
    }

    pub fn log_summary(&self) {
        tracing::debug!(
            contamination = self.contamination,
            n_estimators = self.n_estimators,
            max_samples = self.max_samples,
            seed = self.seed,
            threshold_mode = %self.threshold_mode,
            deviation_ratio = self.deviation_ratio,
            "detector config"
        );
    }
}
