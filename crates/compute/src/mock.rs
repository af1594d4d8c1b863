//! Seeded synthetic metric batches.
//!
//! Used when no input is supplied. The seed is always an explicit argument
//! so two runs with the same seed see the same batch.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Normal, Poisson};

use pulsewatch_core::MetricRow;

/// Generate `n` plausible host metrics.
///
/// - cpu ~ Normal(40, 10)
/// - mem ~ Uniform(4.0, 15.5), rounded to 2 decimals
/// - connections ~ Poisson(20)
/// - query_count ~ Poisson(300)
/// - cache_hit_ratio ~ Normal(0.95, 0.02), clipped to [0, 1]
pub fn generate_mock_metrics(n: usize, seed: u64) -> Vec<MetricRow> {
    let mut rng = StdRng::seed_from_u64(seed);

    let cpu = Normal::<f64>::new(40.0, 10.0).expect("valid cpu distribution");
    let mem = Uniform::<f64>::new(4.0, 15.5);
    let connections = Poisson::<f64>::new(20.0).expect("valid connections distribution");
    let queries = Poisson::<f64>::new(300.0).expect("valid query distribution");
    let cache = Normal::<f64>::new(0.95, 0.02).expect("valid cache distribution");

    (0..n)
        .map(|_| {
            let mem_gb: f64 = mem.sample(&mut rng);
            let conn: f64 = connections.sample(&mut rng);
            let q: f64 = queries.sample(&mut rng);
            let ratio: f64 = cache.sample(&mut rng);
            MetricRow {
                cpu: Some(cpu.sample(&mut rng)),
                mem: Some((mem_gb * 100.0).round() / 100.0),
                connections: Some(conn as u64),
                query_count: Some(q as u64),
                cache_hit_ratio: Some(ratio.clamp(0.0, 1.0)),
            }
        })
        .collect()
}
