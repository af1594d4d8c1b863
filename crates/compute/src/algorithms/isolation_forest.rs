//! Isolation forest (Liu, Ting & Zhou, 2008).
//!
//! Anomalies are the points that random axis-aligned splits isolate in few
//! steps. Each tree is grown on a subsample; the score of a point is derived
//! from its average path length across trees, normalised by the expected
//! path length of an unsuccessful BST search over the subsample size.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use pulsewatch_core::{DetectorConfig, FeatureMatrix, PulseError, Result};

const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Unfitted forest parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForest {
    pub n_estimators: usize,
    pub max_samples: usize,
    /// Share of the training batch labelled anomalous, in `(0, 0.5]`.
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.1,
            seed: 42,
        }
    }
}

impl IsolationForest {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            max_samples: config.max_samples,
            contamination: config.contamination,
            seed: config.seed,
        }
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Grow the forest on `matrix` and derive the labelling threshold from
    /// the training scores.
    ///
    /// Trees are built in parallel. Each tree owns an RNG seeded from the
    /// master seed, so the result does not depend on thread scheduling.
    pub fn fit(&self, matrix: &FeatureMatrix) -> Result<FittedForest> {
        if matrix.is_empty() {
            return Err(PulseError::EmptyInput);
        }
        if self.n_estimators == 0 {
            return Err(PulseError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(PulseError::InvalidConfig(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }

        let n = matrix.len();
        let sample_size = self.max_samples.min(n).max(1);
        let depth_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;

        let mut master = StdRng::seed_from_u64(self.seed);
        let tree_seeds: Vec<u64> = (0..self.n_estimators).map(|_| master.gen()).collect();

        let trees: Vec<IsolationTree> = tree_seeds
            .par_iter()
            .map(|&tree_seed| {
                let mut rng = StdRng::seed_from_u64(tree_seed);
                let mut indices = sample(&mut rng, n, sample_size).into_vec();
                let root = grow(matrix, &mut indices, 0, depth_limit, &mut rng);
                IsolationTree { root }
            })
            .collect();

        let mut forest = FittedForest {
            trees,
            sample_size,
            threshold: f64::INFINITY,
        };

        let scores = forest.score_samples(matrix);
        forest.threshold = percentile(&scores, 1.0 - self.contamination);

        debug!(
            trees = forest.trees.len(),
            sample_size,
            depth_limit,
            threshold = forest.threshold,
            "isolation forest fitted"
        );

        Ok(forest)
    }
}

/// A fitted forest together with its decision threshold.
#[derive(Debug, Clone)]
pub struct FittedForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    threshold: f64,
}

impl FittedForest {
    /// Anomaly score of a single point in `(0, 1]`. Higher is more anomalous.
    pub fn score(&self, point: &[f64]) -> f64 {
        let norm = average_path_length(self.sample_size);
        if norm <= 0.0 || self.trees.is_empty() {
            return 0.5;
        }
        let mean_path: f64 = self
            .trees
            .iter()
            .map(|t| t.path_length(point))
            .sum::<f64>()
            / self.trees.len() as f64;
        2f64.powf(-mean_path / norm)
    }

    /// Score every row of `matrix`.
    pub fn score_samples(&self, matrix: &FeatureMatrix) -> Vec<f64> {
        matrix.rows().par_iter().map(|row| self.score(row)).collect()
    }

    /// `true` for rows scoring strictly above the fitted threshold.
    pub fn predict(&self, matrix: &FeatureMatrix) -> Vec<bool> {
        self.score_samples(matrix)
            .into_iter()
            .map(|s| s > self.threshold)
            .collect()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[derive(Debug, Clone)]
struct IsolationTree {
    root: Node,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl IsolationTree {
    fn path_length(&self, point: &[f64]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
                Node::Split {
                    feature,
                    value,
                    left,
                    right,
                } => {
                    node = if point[*feature] <= *value { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

/// Recursively partition `indices` until isolation or the depth limit.
fn grow(
    matrix: &FeatureMatrix,
    indices: &mut [usize],
    depth: usize,
    depth_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= depth_limit || indices.len() <= 1 {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    // Only features that still vary inside this node can split it.
    let ranges: Vec<(usize, f64, f64)> = (0..matrix.width())
        .filter_map(|f| {
            let (lo, hi) = indices.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &i| {
                let v = matrix.rows()[i][f];
                (lo.min(v), hi.max(v))
            });
            (lo < hi).then_some((f, lo, hi))
        })
        .collect();

    if ranges.is_empty() {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let (feature, lo, hi) = ranges[rng.gen_range(0..ranges.len())];
    let value = split_value(lo, hi, rng.gen::<f64>());

    let mut split = 0;
    for i in 0..indices.len() {
        if matrix.rows()[indices[i]][feature] <= value {
            indices.swap(i, split);
            split += 1;
        }
    }

    let (left_idx, right_idx) = indices.split_at_mut(split);
    Node::Split {
        feature,
        value,
        left: Box::new(grow(matrix, left_idx, depth + 1, depth_limit, rng)),
        right: Box::new(grow(matrix, right_idx, depth + 1, depth_limit, rng)),
    }
}

/// Point at fraction `t` of `[lo, hi]`. Stays finite even when `hi - lo`
/// overflows, as it does for columns spanning most of the f64 range.
fn split_value(lo: f64, hi: f64, t: f64) -> f64 {
    lo * (1.0 - t) + hi * t
}

/// Expected path length of an unsuccessful BST search over `n` points.
pub(crate) fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated quantile `q` in `[0, 1]`.
pub(crate) fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
