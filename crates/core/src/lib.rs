pub mod config;
pub mod error;
pub mod matrix;
pub mod metric;

pub use config::{DetectorConfig, ThresholdMode};
pub use error::*;
pub use matrix::FeatureMatrix;
pub use metric::*;
