use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PulseError, Result};

/// A named column of the metric batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Cpu,
    Mem,
    Connections,
    QueryCount,
    CacheHitRatio,
}

impl MetricField {
    /// Wire name, as it appears in input objects and in verdict output.
    pub fn name(self) -> &'static str {
        match self {
            MetricField::Cpu => "cpu",
            MetricField::Mem => "mem",
            MetricField::Connections => "connections",
            MetricField::QueryCount => "query_count",
            MetricField::CacheHitRatio => "cache_hit_ratio",
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How to treat a field the schema needs but the row does not carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    /// Substitute `0.0`.
    Zero,
    /// Reject the batch.
    Reject,
}

/// Ordered list of fields that maps matrix columns to names.
///
/// Column `i` of any matrix built through a schema holds `fields()[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSchema {
    fields: Vec<MetricField>,
}

impl MetricSchema {
    /// `[cpu, mem, connections, query_count, cache_hit_ratio]`
    pub fn full() -> Self {
        Self {
            fields: vec![
                MetricField::Cpu,
                MetricField::Mem,
                MetricField::Connections,
                MetricField::QueryCount,
                MetricField::CacheHitRatio,
            ],
        }
    }

    /// `[cpu, mem]`
    pub fn cpu_mem() -> Self {
        Self {
            fields: vec![MetricField::Cpu, MetricField::Mem],
        }
    }

    pub fn fields(&self) -> &[MetricField] {
        &self.fields
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Project rows onto this schema's columns.
    pub fn project(&self, rows: &[MetricRow], missing: MissingField) -> Result<Vec<Vec<f64>>> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| {
                self.fields
                    .iter()
                    .map(|&field| match (row.get(field), missing) {
                        (Some(v), _) => Ok(v),
                        (None, MissingField::Zero) => Ok(0.0),
                        (None, MissingField::Reject) => Err(PulseError::InvalidInput(format!(
                            "row {idx}: missing required field '{field}'"
                        ))),
                    })
                    .collect()
            })
            .collect()
    }
}

/// One decoded input sample. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_hit_ratio: Option<f64>,
}

impl MetricRow {
    pub fn get(&self, field: MetricField) -> Option<f64> {
        match field {
            MetricField::Cpu => self.cpu,
            MetricField::Mem => self.mem,
            MetricField::Connections => self.connections.map(|v| v as f64),
            MetricField::QueryCount => self.query_count.map(|v| v as f64),
            MetricField::CacheHitRatio => self.cache_hit_ratio,
        }
    }

    fn validate(&self, idx: usize) -> Result<()> {
        if let Some(ratio) = self.cache_hit_ratio {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(PulseError::InvalidInput(format!(
                    "row {idx}: cache_hit_ratio {ratio} is outside [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// Decode a JSON array of metric objects.
///
/// Unknown keys, non-integer counts and out-of-range ratios are rejected.
pub fn parse_metrics(raw: &str) -> Result<Vec<MetricRow>> {
    let rows: Vec<MetricRow> = serde_json::from_str(raw)?;
    for (idx, row) in rows.iter().enumerate() {
        row.validate(idx)?;
    }
    tracing::debug!(rows = rows.len(), "parsed metric batch");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_rows() {
        let rows = parse_metrics(
            r#"[{"cpu": 41.5, "mem": 8.2, "connections": 20, "query_count": 310, "cache_hit_ratio": 0.94}]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cpu, Some(41.5));
        assert_eq!(rows[0].connections, Some(20));
        assert_eq!(rows[0].get(MetricField::QueryCount), Some(310.0));
    }

    #[test]
    fn missing_fields_are_none() {
        let rows = parse_metrics(r#"[{"cpu": 10}]"#).unwrap();
        assert_eq!(rows[0].mem, None);
        assert_eq!(rows[0].get(MetricField::CacheHitRatio), None);
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_metrics("[]").unwrap().is_empty());
    }

    #[test]
    fn unknown_field_rejected() {
        let err = parse_metrics(r#"[{"cpu": 1, "disk": 3}]"#).unwrap_err();
        assert!(matches!(err, PulseError::InvalidInput(_)));
    }

    #[test]
    fn malformed_json_rejected() {
        let err = parse_metrics("[{").unwrap_err();
        assert!(matches!(err, PulseError::InvalidInput(_)));
    }

    #[test]
    fn non_array_rejected() {
        let err = parse_metrics(r#"{"cpu": 1}"#).unwrap_err();
        assert!(matches!(err, PulseError::InvalidInput(_)));
    }

    #[test]
    fn fractional_count_rejected() {
        let err = parse_metrics(r#"[{"connections": 2.5}]"#).unwrap_err();
        assert!(matches!(err, PulseError::InvalidInput(_)));
    }

    #[test]
    fn ratio_out_of_range_rejected() {
        let err = parse_metrics(r#"[{"cache_hit_ratio": 1.2}]"#).unwrap_err();
        match err {
            PulseError::InvalidInput(msg) => assert!(msg.contains("row 0")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn full_schema_order() {
        assert_eq!(
            MetricSchema::full().names(),
            vec!["cpu", "mem", "connections", "query_count", "cache_hit_ratio"]
        );
        assert_eq!(MetricSchema::cpu_mem().names(), vec!["cpu", "mem"]);
    }

    #[test]
    fn project_substitutes_zero() {
        let rows = vec![MetricRow {
            cpu: Some(12.0),
            query_count: Some(7),
            ..Default::default()
        }];
        let projected = MetricSchema::full()
            .project(&rows, MissingField::Zero)
            .unwrap();
        assert_eq!(projected, vec![vec![12.0, 0.0, 0.0, 7.0, 0.0]]);
    }

    #[test]
    fn project_rejects_missing_when_required() {
        let rows = vec![
            MetricRow {
                cpu: Some(1.0),
                mem: Some(2.0),
                ..Default::default()
            },
            MetricRow {
                cpu: Some(1.0),
                ..Default::default()
            },
        ];
        let err = MetricSchema::cpu_mem()
            .project(&rows, MissingField::Reject)
            .unwrap_err();
        match err {
            PulseError::InvalidInput(msg) => {
                assert!(msg.contains("row 1"));
                assert!(msg.contains("mem"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn field_names_match_wire_format() {
        for field in MetricSchema::full().fields() {
            let wire = serde_json::to_value(field).unwrap();
            assert_eq!(wire, field.name());
        }
    }
}
