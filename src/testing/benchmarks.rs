//! Lightweight timing helper for ad-hoc component benchmarking, mirroring
//! the teacher's `testing::benchmarks::benchmark`. For rigorous
//! statistical benchmarking use the `criterion` harness under `benches/`
//! instead; this is meant for quick checks inside tests.

use std::future::Future;
use std::time::{Duration, Instant};

/// Summary statistics from running an operation `iterations` times.
#[derive(Debug, Clone)]
pub struct BenchmarkResult<T> {
    /// Human-readable label for the benchmarked operation.
    pub name: String,
    /// Number of iterations run.
    pub iterations: usize,
    /// Total wall-clock time across all iterations.
    pub total: Duration,
    /// Mean time per iteration.
    pub mean: Duration,
    /// The result of the final iteration, kept so callers can assert on
    /// correctness alongside timing.
    pub last_result: T,
}

/// Run `f` `iterations` times, timing the total and reporting the mean.
pub async fn benchmark<F, Fut, T>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
{
    let start = Instant::now();
    let mut last = None;
    for _ in 0..iterations.max(1) {
        last = Some(f().await);
    }
    let total = start.elapsed();
    BenchmarkResult {
        name: name.to_string(),
        iterations: iterations.max(1),
        total,
        mean: total / iterations.max(1) as u32,
        last_result: last.expect("iterations.max(1) guarantees at least one run"),
    }
}
