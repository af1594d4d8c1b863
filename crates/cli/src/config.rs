use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use pulsewatch_core::{DetectorConfig, ThresholdMode};

use crate::cli::{DetectorArgs, OptimizeArgs};

/// CLI configuration loaded from TOML file.
///
/// Every key is optional; unset keys leave the environment-derived value alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub detector: DetectorSection,
}

/// `[detector]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorSection {
    pub contamination: Option<f64>,
    pub n_estimators: Option<usize>,
    pub max_samples: Option<usize>,
    pub seed: Option<u64>,
    pub mock_samples: Option<usize>,
    pub threshold_mode: Option<ThresholdMode>,
    pub deviation_ratio: Option<f64>,
}

impl CliConfig {
    /// Return the default config file path: ~/.config/pulsewatch/config.toml
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine user config directory")?
            .join("pulsewatch");
        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the given path, or the default path.
    ///
    /// A missing default file yields an empty config. A missing explicit
    /// path is an error.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (PathBuf::from(p), true),
            None => match Self::default_config_path() {
                Ok(p) => (p, false),
                Err(e) => {
                    debug!(error = %e, "No config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !config_path.exists() {
            if explicit {
                anyhow::bail!("config file not found: {}", config_path.display());
            }
            debug!(?config_path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        debug!(?config_path, "Loading config");
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config: {}", config_path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", config_path.display()))?;
        Ok(config)
    }

    /// Overlay file values onto `base`.
    pub fn apply(&self, base: &mut DetectorConfig) {
        let d = &self.detector;
        if let Some(v) = d.contamination {
            base.contamination = v;
        }
        if let Some(v) = d.n_estimators {
            base.n_estimators = v;
        }
        if let Some(v) = d.max_samples {
            base.max_samples = v;
        }
        if let Some(v) = d.seed {
            base.seed = v;
        }
        if let Some(v) = d.mock_samples {
            base.mock_samples = v;
        }
        if let Some(v) = d.threshold_mode {
            base.threshold_mode = v;
        }
        if let Some(v) = d.deviation_ratio {
            base.deviation_ratio = v;
        }
    }
}

/// Overlay command-line flags, the highest-precedence layer.
pub fn apply_detector_args(args: &DetectorArgs, base: &mut DetectorConfig) {
    if let Some(v) = args.contamination {
        base.contamination = v;
    }
    if let Some(v) = args.estimators {
        base.n_estimators = v;
    }
    if let Some(v) = args.max_samples {
        base.max_samples = v;
    }
    if let Some(v) = args.seed {
        base.seed = v;
    }
}

pub fn apply_optimize_args(args: &OptimizeArgs, base: &mut DetectorConfig) {
    apply_detector_args(&args.detector, base);
    if let Some(v) = args.mock_samples {
        base.mock_samples = v;
    }
    if let Some(v) = args.threshold_mode {
        base.threshold_mode = v;
    }
    if let Some(v) = args.deviation_ratio {
        base.deviation_ratio = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[detector]\ncontamination = 0.05\nseed = 11\nthreshold_mode = \"as-written\""
        )
        .unwrap();

        let config = CliConfig::load(Some(file.path().to_str().unwrap())).unwrap();
        let mut detector = DetectorConfig::default();
        config.apply(&mut detector);

        assert_eq!(detector.contamination, 0.05);
        assert_eq!(detector.seed, 11);
        assert_eq!(detector.threshold_mode, ThresholdMode::AsWritten);
        assert_eq!(detector.n_estimators, 100);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(CliConfig::load(Some(path.to_str().unwrap())).is_err());
    }

    #[test]
    fn test_unknown_key_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[detector]\ntrees = 5").unwrap();
        assert!(CliConfig::load(Some(file.path().to_str().unwrap())).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut detector = DetectorConfig::default();
        CliConfig {
            detector: DetectorSection {
                seed: Some(1),
                ..Default::default()
            },
        }
        .apply(&mut detector);

        let args = DetectorArgs {
            seed: Some(2),
            ..Default::default()
        };
        apply_detector_args(&args, &mut detector);
        assert_eq!(detector.seed, 2);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = CliConfig {
            detector: DetectorSection {
                deviation_ratio: Some(0.75),
                ..Default::default()
            },
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: CliConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.detector.deviation_ratio, Some(0.75));
    }
}
