//! Inference Latency Benchmark
//!
//! Measures forward-pass latency of image classification models and compares
//! models with fused ("end-to-end") preprocessing against models fed by a
//! hand-crafted resize/normalize pipeline.

pub mod cli;
pub mod classify;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod predictor;
pub mod preprocess;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{RunConfig, TimingSample, ClassificationResult, LatencyStatistics, BenchmarkReport, VariantReport};
pub use stats::{percentile, StatisticsCollector};
pub use classify::Synset;
pub use predictor::{Predictor, OnnxPredictor, DataDesc, TensorScope};
pub use preprocess::{ImageTensor, Preprocessor};
pub use executor::BenchmarkRunner;
pub use output::{OutputFormatter, ColoredFormatter, PlainFormatter, OutputFormatterFactory};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build metadata stamped by build.rs
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");
pub const TARGET_TRIPLE: &str = env!("TARGET_TRIPLE");
pub const BUILD_PROFILE: &str = env!("BUILD_PROFILE");

/// Default configuration values
pub mod defaults {
    pub const DEFAULT_MODEL_PATH_PREFIX: &str = "resnet18_v1";
    pub const DEFAULT_INPUT_IMAGE: &str = "images/dog.jpg";
    pub const DEFAULT_INPUT_DIR: &str = "images/";
    pub const DEFAULT_NUM_RUNS: u32 = 1;
    pub const DEFAULT_BATCH_SIZE: u32 = 1;
    pub const DEFAULT_WARM_UP: u32 = 5;
    pub const DEFAULT_INPUT_HEIGHT: u32 = 224;
    pub const DEFAULT_INPUT_WIDTH: u32 = 224;
    pub const DEFAULT_TOP_K: usize = 5;
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Upper bounds enforced by configuration validation
    pub const MAX_NUM_RUNS: u32 = 100_000;
    pub const MAX_WARM_UP: u32 = 10_000;
    pub const MAX_BATCH_SIZE: u32 = 1024;
    pub const MAX_INPUT_DIMENSION: u32 = 8192;

    /// Setting this variable to "1" selects the GPU
    pub const GPU_ENV_VAR: &str = "SCALA_TEST_ON_GPU";

    /// Class label file expected next to the model
    pub const SYNSET_FILE_NAME: &str = "synset.txt";

    /// ImageNet channel statistics
    pub const NORM_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
    pub const NORM_STD: [f32; 3] = [0.229, 0.224, 0.225];
}
