//! Remediation hints for flagged features.
//!
//! Each deviating field maps to one operator-facing suggestion with a rough
//! impact estimate. Fields that share a remedy produce it once.

use serde::{Deserialize, Serialize};

use pulsewatch_core::MetricField;

use super::attribution::FeatureNameSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub suggestion: String,
    /// Expected relative improvement, in `[0, 1]`.
    pub impact: f64,
    /// Fields that triggered this suggestion.
    pub features: Vec<MetricField>,
}

fn remedy(field: MetricField) -> (&'static str, f64) {
    match field {
        MetricField::Cpu => ("Reduce CPU-intensive batch jobs", 0.15),
        MetricField::Mem | MetricField::CacheHitRatio => ("Increase memory cache size", 0.2),
        MetricField::QueryCount | MetricField::Connections => ("Optimize database queries", 0.1),
    }
}

/// Suggestions for `features`, highest impact first.
pub fn suggest(features: &FeatureNameSet) -> Vec<Suggestion> {
    let mut out: Vec<Suggestion> = Vec::new();
    for &field in features {
        let (text, impact) = remedy(field);
        match out.iter_mut().find(|s| s.suggestion == text) {
            Some(existing) => existing.features.push(field),
            None => out.push(Suggestion {
                suggestion: text.to_string(),
                impact,
                features: vec![field],
            }),
        }
    }
    out.sort_by(|a, b| b.impact.total_cmp(&a.impact));
    out
}
