use crate::error::{PulseError, Result};
use crate::metric::{MetricRow, MetricSchema, MissingField};

/// Rectangular batch of numeric samples, one row per input metric.
///
/// Width is fixed at construction; every row has exactly `width()` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<Vec<f64>>,
    width: usize,
}

impl FeatureMatrix {
    /// Build a matrix, rejecting ragged rows and non-finite values.
    pub fn new(rows: Vec<Vec<f64>>, width: usize) -> Result<Self> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(PulseError::InvalidInput(format!(
                    "row {idx} has {} columns, expected {width}",
                    row.len()
                )));
            }
            if let Some(col) = row.iter().position(|v| !v.is_finite()) {
                return Err(PulseError::InvalidInput(format!(
                    "row {idx} column {col} is not a finite number"
                )));
            }
        }
        Ok(Self { rows, width })
    }

    /// Build a matrix whose columns follow `schema`.
    pub fn from_metrics(
        schema: &MetricSchema,
        metrics: &[MetricRow],
        missing: MissingField,
    ) -> Result<Self> {
        let rows = schema.project(metrics, missing)?;
        Self::new(rows, schema.len())
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&[f64]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy out column `col`.
    pub fn column(&self, col: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[col]).collect()
    }
}
