//! Latency statistics for benchmark runs
//!
//! Percentiles use the nearest-rank rule previous benchmark reports were
//! produced with: sort ascending, take index `ceil((n - 1) * p / 100)`, no
//! interpolation. The index arithmetic is done in `f64` exactly as those
//! reports did, so results stay comparable across tools.

use crate::{
    error::{AppError, Result},
    models::metrics::{LatencyStatistics, SampleLabel, TimingSample},
    types::TrimStrategy,
};
use std::time::Duration;

const NANOS_PER_MILLI: f64 = 1.0e6;

/// Index of the `p`-th percentile in a sorted array of length `n`
pub fn percentile_index(p: f64, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let index = ((n - 1) as f64 * (p / 100.0)).ceil() as usize;
    index.min(n - 1)
}

/// Nearest-rank percentile of an ascending-sorted slice
pub fn percentile(p: f64, sorted: &[u64]) -> Result<u64> {
    if sorted.is_empty() {
        return Err(AppError::statistics("Cannot compute a percentile of zero samples"));
    }
    if !(0.0..=100.0).contains(&p) {
        return Err(AppError::statistics(format!("Percentile must be within 0..=100, got {}", p)));
    }
    Ok(sorted[percentile_index(p, sorted.len())])
}

/// Arithmetic mean in nanoseconds
pub fn average(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum: u128 = samples.iter().map(|&s| s as u128).sum();
    Some(sum as f64 / samples.len() as f64)
}

/// Apply a trim strategy to samples in run order
pub fn trim(samples: &[u64], strategy: TrimStrategy) -> &[u64] {
    match strategy {
        TrimStrategy::None => samples,
        TrimStrategy::HeadTail if samples.len() > 2 => &samples[1..samples.len() - 1],
        TrimStrategy::HeadTail => samples,
    }
}

impl LatencyStatistics {
    /// Compute statistics from samples in nanoseconds (any order)
    pub fn from_nanos(samples: &[u64]) -> Result<Self> {
        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let average_ns = average(&sorted)
            .ok_or_else(|| AppError::statistics("No samples retained for statistics"))?;

        Ok(Self {
            count: sorted.len(),
            average_ms: average_ns / NANOS_PER_MILLI,
            p50_ms: percentile(50.0, &sorted)? as f64 / NANOS_PER_MILLI,
            p90_ms: percentile(90.0, &sorted)? as f64 / NANOS_PER_MILLI,
            p99_ms: percentile(99.0, &sorted)? as f64 / NANOS_PER_MILLI,
            min_ms: sorted[0] as f64 / NANOS_PER_MILLI,
            max_ms: sorted[sorted.len() - 1] as f64 / NANOS_PER_MILLI,
        })
    }
}

/// Accumulates the samples of one benchmarked model
#[derive(Debug, Clone)]
pub struct StatisticsCollector {
    label: SampleLabel,
    warm_up: u32,
    trim: TrimStrategy,
    samples: Vec<TimingSample>,
}

impl StatisticsCollector {
    pub fn new(label: SampleLabel, warm_up: u32, trim: TrimStrategy) -> Self {
        Self {
            label,
            warm_up,
            trim,
            samples: Vec::new(),
        }
    }

    /// Record the duration of iteration `run_index`; the first `warm_up`
    /// iterations are flagged and excluded from statistics.
    pub fn record(&mut self, run_index: u32, duration: Duration) -> &TimingSample {
        let sample = TimingSample::new(run_index, duration, self.label, run_index < self.warm_up);
        self.samples.push(sample);
        &self.samples[self.samples.len() - 1]
    }

    pub fn is_warm_up(&self, run_index: u32) -> bool {
        run_index < self.warm_up
    }

    pub fn samples(&self) -> &[TimingSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Measured durations after warm-up exclusion and trimming, in run order
    pub fn retained_nanos(&self) -> Vec<u64> {
        let mut measured: Vec<&TimingSample> = self.samples.iter().filter(|s| !s.warm_up).collect();
        measured.sort_by_key(|s| s.run_index);
        let measured: Vec<u64> = measured.iter().map(|s| s.duration_ns).collect();
        trim(&measured, self.trim).to_vec()
    }

    pub fn summarize(&self) -> Result<LatencyStatistics> {
        LatencyStatistics::from_nanos(&self.retained_nanos())
    }

    pub fn into_samples(self) -> Vec<TimingSample> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelVariant, RunKind};
    use proptest::prelude::*;

    fn label() -> SampleLabel {
        SampleLabel::new(RunKind::Single, ModelVariant::NonEndToEnd)
    }

    #[test]
    fn test_percentile_example() {
        let mut samples = vec![5u64, 1, 3, 2, 4];
        samples.sort_unstable();
        assert_eq!(samples, vec![1, 2, 3, 4, 5]);
        assert_eq!(percentile(50.0, &samples).unwrap(), 3);
        assert_eq!(percentile(90.0, &samples).unwrap(), 5);
        assert_eq!(percentile(0.0, &samples).unwrap(), 1);
        assert_eq!(percentile(100.0, &samples).unwrap(), 5);
    }

    #[test]
    fn test_percentile_index_matches_nearest_rank() {
        // n = 11: (n-1) * 0.9 = 9
        assert_eq!(percentile_index(90.0, 11), 9);
        // n = 10: 9 * 0.9 = 8.1 -> 9
        assert_eq!(percentile_index(90.0, 10), 9);
        // n = 4: 3 * 0.5 = 1.5 -> 2
        assert_eq!(percentile_index(50.0, 4), 2);
        assert_eq!(percentile_index(99.0, 1), 0);
    }

    #[test]
    fn test_percentile_errors() {
        assert!(percentile(50.0, &[]).is_err());
        assert!(percentile(101.0, &[1, 2]).is_err());
        assert!(percentile(-1.0, &[1, 2]).is_err());
    }

    #[test]
    fn test_average_example() {
        let samples = [10_000_000u64, 20_000_000, 30_000_000];
        let stats = LatencyStatistics::from_nanos(&samples).unwrap();
        assert_eq!(stats.count, 3);
        assert!((stats.average_ms - 20.0).abs() < 1e-9);
        assert!((stats.min_ms - 10.0).abs() < 1e-9);
        assert!((stats.max_ms - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_does_not_overflow() {
        let samples = [u64::MAX, u64::MAX];
        let avg = average(&samples).unwrap();
        assert!((avg - u64::MAX as f64).abs() / (u64::MAX as f64) < 1e-12);
    }

    #[test]
    fn test_head_tail_trim() {
        let samples = [100u64, 2, 3, 4, 90];
        assert_eq!(trim(&samples, TrimStrategy::HeadTail), &[2, 3, 4]);
        assert_eq!(trim(&samples, TrimStrategy::None), &samples);
        // Two or fewer samples are never trimmed away
        assert_eq!(trim(&[7u64, 8], TrimStrategy::HeadTail), &[7, 8]);
    }

    #[test]
    fn test_collector_excludes_warm_up() {
        let mut collector = StatisticsCollector::new(label(), 2, TrimStrategy::None);
        for (i, ms) in [500u64, 400, 10, 20, 30].iter().enumerate() {
            collector.record(i as u32, Duration::from_millis(*ms));
        }

        assert_eq!(collector.len(), 5);
        assert!(collector.samples()[0].warm_up);
        assert!(collector.samples()[1].warm_up);
        assert!(!collector.samples()[2].warm_up);

        let stats = collector.summarize().unwrap();
        assert_eq!(stats.count, 3);
        assert!((stats.average_ms - 20.0).abs() < 1e-9);
        assert!((stats.p50_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_collector_warm_up_then_trim() {
        let mut collector = StatisticsCollector::new(label(), 1, TrimStrategy::HeadTail);
        for (i, ms) in [999u64, 50, 10, 20, 30, 70].iter().enumerate() {
            collector.record(i as u32, Duration::from_millis(*ms));
        }
        // warm-up drops 999, head/tail drops 50 and 70
        assert_eq!(collector.retained_nanos(), vec![10_000_000, 20_000_000, 30_000_000]);
    }

    #[test]
    fn test_collector_all_warm_up_has_no_statistics() {
        let mut collector = StatisticsCollector::new(label(), 5, TrimStrategy::None);
        collector.record(0, Duration::from_millis(3));
        assert!(collector.summarize().is_err());
    }

    proptest! {
        #[test]
        fn prop_percentile_is_nearest_rank(
            mut samples in proptest::collection::vec(0u64..10_000_000_000, 1..200),
            p in 0u32..=100,
        ) {
            samples.sort_unstable();
            let n = samples.len();
            let expected = samples[((n - 1) as f64 * (p as f64 / 100.0)).ceil() as usize];
            prop_assert_eq!(percentile(p as f64, &samples).unwrap(), expected);
        }

        #[test]
        fn prop_average_is_arithmetic_mean(
            samples in proptest::collection::vec(0u64..1_000_000_000, 1..200),
        ) {
            let stats = LatencyStatistics::from_nanos(&samples).unwrap();
            let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / samples.len() as f64;
            prop_assert!((stats.average_ms - mean / 1.0e6).abs() < 1e-6);
            prop_assert!(stats.min_ms <= stats.p50_ms);
            prop_assert!(stats.p50_ms <= stats.p90_ms);
            prop_assert!(stats.p90_ms <= stats.p99_ms);
            prop_assert!(stats.p99_ms <= stats.max_ms);
        }
    }
}
