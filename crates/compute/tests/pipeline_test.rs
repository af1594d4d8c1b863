//! End-to-end runs of both pipelines on seeded batches with the real
//! isolation forest.

use pulsewatch_compute::{generate_mock_metrics, Pipeline};
use pulsewatch_core::{parse_metrics, DetectorConfig, MetricField, MetricRow, ThresholdMode};

fn spiked_batch() -> Vec<MetricRow> {
    let mut metrics = generate_mock_metrics(60, 42);
    metrics.push(MetricRow {
        cpu: Some(400.0),
        mem: Some(9.0),
        connections: Some(20),
        query_count: Some(5000),
        cache_hit_ratio: Some(0.95),
    });
    metrics
}

#[test]
fn mock_batch_flags_about_contamination_share() {
    let config = DetectorConfig::default();
    let metrics = generate_mock_metrics(config.mock_samples, config.seed);
    let verdict = Pipeline::from_config(&config).optimize(&metrics).unwrap();

    assert!(verdict.anomaly);
    assert!((1..=10).contains(&verdict.anomaly_count), "count {}", verdict.anomaly_count);
    assert_eq!(verdict.score, verdict.anomaly_count as f64 / 100.0);
}

#[test]
fn same_seed_same_verdict() {
    let config = DetectorConfig::default();
    let metrics = generate_mock_metrics(80, 3);
    let a = Pipeline::from_config(&config).optimize(&metrics).unwrap();
    let b = Pipeline::from_config(&config).optimize(&metrics).unwrap();
    assert_eq!(a, b);
}

#[test]
fn spike_is_attributed_to_cpu_and_queries() {
    let config = DetectorConfig::default();
    let verdict = Pipeline::from_config(&config)
        .optimize(&spiked_batch())
        .unwrap();

    assert!(verdict.anomaly);
    assert!(verdict.features.contains(&MetricField::Cpu));
    assert!(verdict.features.contains(&MetricField::QueryCount));
}

#[test]
fn suggestions_follow_features() {
    let config = DetectorConfig::default();
    let verdict = Pipeline::from_config(&config)
        .with_suggestions(true)
        .optimize(&spiked_batch())
        .unwrap();

    let suggestions = verdict.suggestions.expect("suggestions requested");
    assert!(suggestions
        .iter()
        .any(|s| s.suggestion == "Reduce CPU-intensive batch jobs"));
}

#[test]
fn anomaly_run_on_parsed_json() {
    let mut raw = String::from("[");
    for i in 0..30 {
        raw.push_str(&format!(r#"{{"cpu": {}, "mem": 8.0}},"#, 40 + (i % 5)));
    }
    raw.push_str(r#"{"cpu": 99.0, "mem": 15.9}]"#);

    let metrics = parse_metrics(&raw).unwrap();
    let summary = Pipeline::from_config(&DetectorConfig::default())
        .anomaly(&metrics)
        .unwrap();

    assert!(summary.anomaly);
    assert!(summary.score > 0.0 && summary.score <= 0.1 + f64::EPSILON);
}

#[test]
fn threshold_mode_is_honoured_end_to_end() {
    let config = DetectorConfig {
        threshold_mode: ThresholdMode::AsWritten,
        ..Default::default()
    };
    // Non-negative metrics: both modes agree.
    let signed = Pipeline::from_config(&config).optimize(&spiked_batch()).unwrap();
    let corrected = Pipeline::from_config(&DetectorConfig::default())
        .optimize(&spiked_batch())
        .unwrap();
    assert_eq!(signed.features, corrected.features);
}
