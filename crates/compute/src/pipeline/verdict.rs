use serde::{Deserialize, Serialize};

use pulsewatch_core::MetricField;

use super::attribution::FeatureNameSet;
use super::suggestions::Suggestion;

/// Share of rows flagged anomalous; 0 for an empty batch.
pub fn anomaly_ratio(anomaly_count: usize, total_rows: usize) -> f64 {
    if total_rows == 0 {
        0.0
    } else {
        anomaly_count as f64 / total_rows as f64
    }
}

/// Full verdict for the `optimize` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub anomaly: bool,
    pub score: f64,
    pub features: Vec<MetricField>,
    pub anomaly_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Suggestion>>,
}

impl Verdict {
    pub fn new(anomaly_count: usize, total_rows: usize, features: &FeatureNameSet) -> Self {
        Self {
            anomaly: anomaly_count > 0,
            score: anomaly_ratio(anomaly_count, total_rows),
            features: features.iter().copied().collect(),
            anomaly_count,
            suggestions: None,
        }
    }

    /// Verdict for a batch with no rows.
    pub fn empty() -> Self {
        Self::new(0, 0, &FeatureNameSet::new())
    }

    pub fn with_suggestions(mut self, suggestions: Vec<Suggestion>) -> Self {
        self.suggestions = Some(suggestions);
        self
    }
}

/// Reduced verdict for the `anomaly` run (no attribution).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalySummary {
    pub anomaly: bool,
    pub score: f64,
}

impl AnomalySummary {
    pub fn new(anomaly_count: usize, total_rows: usize) -> Self {
        Self {
            anomaly: anomaly_count > 0,
            score: anomaly_ratio(anomaly_count, total_rows),
        }
    }
}
