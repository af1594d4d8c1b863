pub mod algorithms;
pub mod mock;
pub mod pipeline;

pub use algorithms::isolation_forest::{FittedForest, IsolationForest};
pub use mock::generate_mock_metrics;
pub use pipeline::attribution::{attribute, AnomalyIndexSet, AttributionPolicy, FeatureNameSet};
pub use pipeline::suggestions::Suggestion;
pub use pipeline::verdict::{AnomalySummary, Verdict};
pub use pipeline::{AnomalyScorer, Pipeline};
