//! Detection pipeline orchestrator.
//!
//! Wires the metric schema, the anomaly scorer and feature attribution into
//! the two batch runs the CLI exposes:
//!
//! - **anomaly**: cpu/mem only, reports whether anything is anomalous.
//! - **optimize**: full schema, also reports which fields deviated.

pub mod attribution;
pub mod population;
pub mod suggestions;
pub mod verdict;

use std::time::Instant;

use tracing::{debug, info};

use pulsewatch_core::{
    DetectorConfig, FeatureMatrix, MetricRow, MetricSchema, MissingField, Result,
};

use crate::algorithms::isolation_forest::IsolationForest;

use self::attribution::{attribute, AnomalyIndexSet, AttributionPolicy};
use self::suggestions::suggest;
use self::verdict::{AnomalySummary, Verdict};

/// Trait abstracting the anomaly labelling step.
///
/// Implemented by `IsolationForest` and test doubles. Decouples attribution
/// from the concrete detector.
pub trait AnomalyScorer {
    /// Fit on `matrix` and return the positions of its anomalous rows.
    fn fit_predict(&self, matrix: &FeatureMatrix) -> Result<AnomalyIndexSet>;
}

impl AnomalyScorer for IsolationForest {
    fn fit_predict(&self, matrix: &FeatureMatrix) -> Result<AnomalyIndexSet> {
        let forest = self.fit(matrix)?;
        Ok(forest
            .predict(matrix)
            .into_iter()
            .enumerate()
            .filter_map(|(idx, anomalous)| anomalous.then_some(idx))
            .collect())
    }
}

/// Main pipeline combining scoring and attribution.
pub struct Pipeline<S: AnomalyScorer> {
    scorer: S,
    policy: AttributionPolicy,
    suggest: bool,
}

impl Pipeline<IsolationForest> {
    /// Create a pipeline backed by an isolation forest built from `config`.
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(
            IsolationForest::from_config(config),
            AttributionPolicy::from_config(config),
        )
    }
}

impl<S: AnomalyScorer> Pipeline<S> {
    pub fn new(scorer: S, policy: AttributionPolicy) -> Self {
        Self {
            scorer,
            policy,
            suggest: false,
        }
    }

    /// Attach remediation suggestions to `optimize` verdicts.
    pub fn with_suggestions(mut self, enabled: bool) -> Self {
        self.suggest = enabled;
        self
    }

    /// Score the batch on every schema field and attribute the anomalies.
    ///
    /// Missing fields count as 0. An empty batch yields the empty verdict
    /// without consulting the scorer.
    pub fn optimize(&self, metrics: &[MetricRow]) -> Result<Verdict> {
        let start = Instant::now();
        let schema = MetricSchema::full();
        let matrix = FeatureMatrix::from_metrics(&schema, metrics, MissingField::Zero)?;

        if matrix.is_empty() {
            debug!("empty batch, skipping detection");
            return Ok(self.finish(Verdict::empty()));
        }

        let anomalies = self.scorer.fit_predict(&matrix)?;
        let features = attribute(&matrix, &anomalies, schema.fields(), &self.policy)?;

        let mut verdict = Verdict::new(anomalies.len(), matrix.len(), &features);
        if self.suggest {
            verdict = verdict.with_suggestions(suggest(&features));
        }

        info!(
            rows = matrix.len(),
            anomalies = verdict.anomaly_count,
            features = ?verdict.features,
            elapsed_ms = start.elapsed().as_millis(),
            "optimize completed"
        );

        Ok(verdict)
    }

    /// Score the batch on cpu and mem only. Both fields are required on every row.
    pub fn anomaly(&self, metrics: &[MetricRow]) -> Result<AnomalySummary> {
        let start = Instant::now();
        let schema = MetricSchema::cpu_mem();
        let matrix = FeatureMatrix::from_metrics(&schema, metrics, MissingField::Reject)?;

        if matrix.is_empty() {
            debug!("empty batch, skipping detection");
            return Ok(AnomalySummary::new(0, 0));
        }

        let anomalies = self.scorer.fit_predict(&matrix)?;
        let summary = AnomalySummary::new(anomalies.len(), matrix.len());

        info!(
            rows = matrix.len(),
            anomalies = anomalies.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "anomaly completed"
        );

        Ok(summary)
    }

    fn finish(&self, verdict: Verdict) -> Verdict {
        if self.suggest {
            verdict.with_suggestions(Vec::new())
        } else {
            verdict
        }
    }
}
