//! Feature attribution for anomalous rows.
//!
//! A field "contributes" to an anomaly when the anomalous row's value sits
//! further from the batch median than a fixed fraction of that median.
//! Attribution runs once per batch and returns the union over all flagged
//! rows.

use std::collections::BTreeSet;

use tracing::debug;

use pulsewatch_core::{
    DetectorConfig, FeatureMatrix, MetricField, PulseError, Result, ThresholdMode,
};

use super::population::column_medians;

/// Row positions (0-based) an anomaly scorer marked anomalous.
pub type AnomalyIndexSet = BTreeSet<usize>;

/// Fields that deviated on at least one anomalous row.
pub type FeatureNameSet = BTreeSet<MetricField>;

/// Default fraction of the median a deviation must exceed.
pub const DEFAULT_DEVIATION_RATIO: f64 = 0.5;

/// Threshold policy for attribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributionPolicy {
    pub mode: ThresholdMode,
    pub ratio: f64,
}

impl Default for AttributionPolicy {
    fn default() -> Self {
        Self {
            mode: ThresholdMode::Corrected,
            ratio: DEFAULT_DEVIATION_RATIO,
        }
    }
}

impl AttributionPolicy {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            mode: config.threshold_mode,
            ratio: config.deviation_ratio,
        }
    }

    /// Whether `delta` from `median` is large enough to flag the field.
    ///
    /// Strict comparison: a delta exactly on the threshold does not flag.
    pub fn deviates(&self, delta: f64, median: f64) -> bool {
        delta.abs() > self.mode.threshold(median, self.ratio)
    }
}

/// Determine which fields plausibly made the anomalous rows anomalous.
///
/// `fields` names the matrix columns in order. Fails with `InvalidInput`
/// when the matrix width disagrees with `fields` or an index is out of
/// range. An empty anomaly set always yields an empty result.
pub fn attribute(
    matrix: &FeatureMatrix,
    anomalies: &AnomalyIndexSet,
    fields: &[MetricField],
    policy: &AttributionPolicy,
) -> Result<FeatureNameSet> {
    if matrix.width() != fields.len() {
        return Err(PulseError::InvalidInput(format!(
            "matrix has {} columns but {} field names were given",
            matrix.width(),
            fields.len()
        )));
    }
    if let Some(&bad) = anomalies.iter().find(|&&idx| idx >= matrix.len()) {
        return Err(PulseError::InvalidInput(format!(
            "anomaly index {bad} out of range for {} rows",
            matrix.len()
        )));
    }
    if anomalies.is_empty() {
        return Ok(FeatureNameSet::new());
    }

    let medians = column_medians(matrix)?;
    let mut flagged = FeatureNameSet::new();

    for &idx in anomalies {
        let row = &matrix.rows()[idx];
        let row_fields: Vec<MetricField> = row
            .iter()
            .zip(&medians)
            .zip(fields)
            .filter(|((value, median), _)| policy.deviates(*value - *median, **median))
            .map(|(_, field)| *field)
            .collect();

        debug!(row = idx, fields = ?row_fields, "row attribution");
        flagged.extend(row_fields);
    }

    Ok(flagged)
}
