use serde::Serialize;
use tracing::warn;

const BYTES_PER_GIB: f64 = (1u64 << 30) as f64;

/// Derived latency and throughput figures for one gather workload.
/// Throughput divides by the *sum* of per-batch latencies rather than
/// wall-clock elapsed, isolating time spent inside the gather calls.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BenchStats {
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,

    pub qps: f64,
    pub tensors_per_sec: f64,
    pub gib_per_sec: f64,

    pub total_queries: usize,
    pub total_tensors: u64,
}

impl BenchStats {
    pub fn compute(latencies_us: &[u64], total_tensors: u64, tensor_size: usize) -> Self {
        if latencies_us.is_empty() {
            warn!("no latencies recorded");
            return Self::default();
        }

        let mut sorted = latencies_us.to_vec();
        sorted.sort_unstable();

        let n = sorted.len();
        let total_us: f64 = sorted.iter().map(|&us| us as f64).sum();
        let mean_us = total_us / n as f64;
        let sq_diff_sum: f64 = sorted
            .iter()
            .map(|&us| (us as f64 - mean_us).powi(2))
            .sum();
        let std_dev_us = (sq_diff_sum / n as f64).sqrt();

        let total_s = total_us / 1e6;
        let total_bytes = total_tensors as f64 * tensor_size as f64 * 4.0;

        Self {
            mean_ms: mean_us / 1000.0,
            std_dev_ms: std_dev_us / 1000.0,
            min_ms: sorted[0] as f64 / 1000.0,
            max_ms: sorted[n - 1] as f64 / 1000.0,
            p50_ms: percentile_us(&sorted, 50.0) as f64 / 1000.0,
            p95_ms: percentile_us(&sorted, 95.0) as f64 / 1000.0,
            p99_ms: percentile_us(&sorted, 99.0) as f64 / 1000.0,
            qps: n as f64 / total_s,
            tensors_per_sec: total_tensors as f64 / total_s,
            gib_per_sec: total_bytes / (total_s * BYTES_PER_GIB),
            total_queries: n,
            total_tensors,
        }
    }
}

/// Percentile p lives at index `ceil(p/100 * n) - 1` of the sorted
/// sequence, clamped to valid bounds.
fn percentile_us(sorted: &[u64], p: f64) -> u64 {
    let n = sorted.len();
    let idx = (p / 100.0 * n as f64).ceil() as usize;
    sorted[idx.saturating_sub(1).min(n - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_of_a_monotone_sequence_hits_the_index_law() {
        let sorted: Vec<u64> = (1..=100).collect();
        assert_eq!(percentile_us(&sorted, 50.0), 50);
        assert_eq!(percentile_us(&sorted, 95.0), 95);
        assert_eq!(percentile_us(&sorted, 99.0), 99);
        assert_eq!(percentile_us(&sorted, 100.0), 100);
    }

    #[test]
    fn percentile_clamps_on_tiny_inputs() {
        assert_eq!(percentile_us(&[42], 50.0), 42);
        assert_eq!(percentile_us(&[42], 99.0), 42);
        assert_eq!(percentile_us(&[7, 9], 1.0), 7);
    }

    #[test]
    fn throughput_uses_summed_latency() {
        // Two batches of 500ms each: 2 queries / 1 second.
        let stats = BenchStats::compute(&[500_000, 500_000], 2_048, 128);
        assert!((stats.qps - 2.0).abs() < 1e-9);
        assert!((stats.tensors_per_sec - 2_048.0).abs() < 1e-6);

        let expected_gib = (2_048.0 * 128.0 * 4.0) / BYTES_PER_GIB;
        assert!((stats.gib_per_sec - expected_gib).abs() < 1e-9);
    }

    #[test]
    fn mean_and_std_dev_match_hand_computation() {
        let stats = BenchStats::compute(&[1_000, 3_000], 0, 0);
        assert!((stats.mean_ms - 2.0).abs() < 1e-9);
        assert!((stats.std_dev_ms - 1.0).abs() < 1e-9);
        assert!((stats.min_ms - 1.0).abs() < 1e-9);
        assert!((stats.max_ms - 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_latencies_yield_zeroed_stats() {
        let stats = BenchStats::compute(&[], 10, 4);
        assert_eq!(stats.total_queries, 0);
        assert_eq!(stats.qps, 0.0);
    }
}
