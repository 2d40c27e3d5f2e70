//! Data models and structures for the inference latency benchmark

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::RunConfig;
pub use metrics::{
    BenchmarkReport, ClassificationResult, LatencyStatistics, SampleLabel, TimingSample,
    VariantReport,
};
