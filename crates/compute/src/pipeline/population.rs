//! Column statistics over a whole batch.
//!
//! The median vector is the baseline every anomalous row is compared
//! against during feature attribution.

use pulsewatch_core::{FeatureMatrix, PulseError, Result};

/// Median of `values`. Even-length input averages the two middle values.
///
/// Returns `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Column-wise median of the matrix, one entry per column.
pub fn column_medians(matrix: &FeatureMatrix) -> Result<Vec<f64>> {
    if matrix.is_empty() {
        return Err(PulseError::EmptyInput);
    }
    (0..matrix.width())
        .map(|col| median(&matrix.column(col)).ok_or(PulseError::EmptyInput))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
    }

    #[test]
    fn median_even_averages_middle() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn median_empty() {
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn medians_per_column() {
        let m = FeatureMatrix::new(
            vec![
                vec![10.0, 5.0],
                vec![10.0, 5.0],
                vec![10.0, 5.0],
                vec![100.0, 5.0],
            ],
            2,
        )
        .unwrap();
        assert_eq!(column_medians(&m).unwrap(), vec![10.0, 5.0]);
    }

    #[test]
    fn medians_of_empty_matrix() {
        let m = FeatureMatrix::new(Vec::new(), 3).unwrap();
        assert!(matches!(column_medians(&m), Err(PulseError::EmptyInput)));
    }
}
