//! Timing samples, classification results and benchmark report models

use crate::types::{Device, ModelVariant, PreprocessKind, RunKind, TimedRegion, TrimStrategy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which measurement a sample belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleLabel {
    pub kind: RunKind,
    pub variant: ModelVariant,
}

impl SampleLabel {
    pub fn new(kind: RunKind, variant: ModelVariant) -> Self {
        Self { kind, variant }
    }
}

/// One predictor invocation, measured in nanoseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSample {
    /// Iteration index, warm-up iterations included
    pub run_index: u32,

    /// Wall-clock time of the timed region
    pub duration_ns: u64,

    pub label: SampleLabel,

    /// Warm-up samples are kept for logging but never enter statistics
    pub warm_up: bool,

    pub timestamp: DateTime<Utc>,
}

impl TimingSample {
    pub fn new(run_index: u32, duration: Duration, label: SampleLabel, warm_up: bool) -> Self {
        Self {
            run_index,
            // Saturate instead of wrapping; u64 nanoseconds cover ~584 years
            duration_ns: u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX),
            label,
            warm_up,
            timestamp: Utc::now(),
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ns as f64 / 1.0e6
    }
}

/// Winning class of one output vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub index: usize,
    pub label: String,
    pub probability: f32,
}

impl ClassificationResult {
    /// Console line in the format prior benchmark logs were parsed with
    pub fn report_line(&self) -> String {
        format!("Probability : {} Class : {}", self.probability, self.label)
    }
}

/// Latency statistics over the retained samples, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStatistics {
    /// Samples that entered the statistics
    pub count: usize,
    pub average_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p99_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Result of benchmarking one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantReport {
    pub variant: ModelVariant,
    pub kind: RunKind,
    pub model_path_prefix: String,
    pub preprocess: PreprocessKind,
    pub trim: TrimStrategy,

    /// Part of each iteration the samples cover
    #[serde(default = "default_timed_region")]
    pub timed_region: TimedRegion,

    /// Configured images per batch (1 for single inference)
    pub batch_size: u32,

    /// Images fed to the predictor during measured iterations
    #[serde(default)]
    pub images_processed: u64,

    /// Predictor calls during measured iterations
    #[serde(default)]
    pub batches_processed: u64,

    /// Every sample, warm-up included
    pub samples: Vec<TimingSample>,

    /// `None` when no sample survived warm-up exclusion and trimming
    pub statistics: Option<LatencyStatistics>,

    /// Winning class of every image in the last measured run
    pub classifications: Vec<ClassificationResult>,

    /// Best classes of the first image in the last measured run, best first
    pub top_classes: Vec<ClassificationResult>,

    /// Runs or batches skipped because their input could not be prepared
    pub failed_runs: u32,

    /// Time spent loading the model, before any iteration
    #[serde(default)]
    pub model_load_ms: Option<f64>,

    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl VariantReport {
    pub fn new(
        variant: ModelVariant,
        kind: RunKind,
        model_path_prefix: &str,
        preprocess: PreprocessKind,
        trim: TrimStrategy,
        batch_size: u32,
    ) -> Self {
        Self {
            variant,
            kind,
            model_path_prefix: model_path_prefix.to_string(),
            preprocess,
            trim,
            timed_region: TimedRegion::Predict,
            batch_size,
            images_processed: 0,
            batches_processed: 0,
            samples: Vec::new(),
            statistics: None,
            classifications: Vec::new(),
            top_classes: Vec::new(),
            failed_runs: 0,
            model_load_ms: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn metrics_prefix(&self) -> &'static str {
        self.kind.metrics_prefix()
    }

    /// Mean images per predictor call; the last batch of a directory may be short
    pub fn images_per_batch(&self) -> f64 {
        if self.batches_processed > 0 && self.images_processed > 0 {
            self.images_processed as f64 / self.batches_processed as f64
        } else {
            self.batch_size.max(1) as f64
        }
    }

    /// Average latency per image, only meaningful for batch inference
    pub fn per_image_average_ms(&self) -> Option<f64> {
        match self.kind {
            RunKind::Batch => self
                .statistics
                .as_ref()
                .map(|s| s.average_ms / self.images_per_batch()),
            RunKind::Single => None,
        }
    }

    pub fn measured_samples(&self) -> impl Iterator<Item = &TimingSample> {
        self.samples.iter().filter(|s| !s.warm_up)
    }
}

fn default_timed_region() -> TimedRegion {
    TimedRegion::Predict
}

/// Everything one invocation of the benchmark produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Device requested by the configuration
    pub requested_device: Device,

    /// Device the runtime actually executed on
    pub effective_device: Device,

    pub variants: Vec<VariantReport>,
    pub generated_at: DateTime<Utc>,
}

impl BenchmarkReport {
    pub fn new(requested_device: Device, effective_device: Device) -> Self {
        Self {
            requested_device,
            effective_device,
            variants: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    pub fn variant(&self, variant: ModelVariant) -> Option<&VariantReport> {
        self.variants.iter().find(|v| v.variant == variant)
    }

    /// End-to-end and non end-to-end averages, when both models ran
    pub fn comparison(&self) -> Option<(f64, f64)> {
        let e2e = self.variant(ModelVariant::EndToEnd)?.statistics.as_ref()?;
        let non_e2e = self.variant(ModelVariant::NonEndToEnd)?.statistics.as_ref()?;
        Some((e2e.average_ms, non_e2e.average_ms))
    }

    pub fn total_failed_runs(&self) -> u32 {
        self.variants.iter().map(|v| v.failed_runs).sum()
    }
}
