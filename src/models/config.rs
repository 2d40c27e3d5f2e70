//! Run configuration data model and validation

use crate::defaults;
use crate::types::{
    AppError, ChannelOrder, Device, ModelVariant, PreprocessKind, ResizeFilter, Result, RunKind,
    TensorLayout, TimedRegion, TrimStrategy,
};
use serde::{Deserialize, Serialize};

/// Benchmark configuration, built once from defaults, environment and CLI.
///
/// Nothing mutates a `RunConfig` after [`crate::config::load_config`] returns;
/// every component receives it by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Model path prefix of the model fed by host-side preprocessing
    #[serde(default = "default_model_path_prefix")]
    pub model_path_prefix: String,

    /// Model path prefix of the model with fused preprocessing, if compared
    #[serde(default)]
    pub e2e_model_path_prefix: Option<String>,

    /// Image used for single inference
    #[serde(default = "default_input_image")]
    pub input_image: String,

    /// Directory of images used for batch inference
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// Number of measured runs
    #[serde(default = "default_num_runs")]
    pub num_runs: u32,

    /// Images per batch in batch mode
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Runs executed before measurement starts
    #[serde(default = "default_warm_up")]
    pub warm_up: u32,

    /// Request the GPU
    #[serde(default)]
    pub use_gpu: bool,

    /// Run batch inference over `input_dir` instead of single inference
    #[serde(default)]
    pub use_batch: bool,

    /// Explicit preprocessing strategy for the non end-to-end model
    #[serde(default)]
    pub preprocess: Option<PreprocessKind>,

    /// Sample trimming applied after warm-up exclusion
    #[serde(default = "default_trim")]
    pub trim: TrimStrategy,

    /// Part of each iteration a sample covers
    #[serde(default = "default_timed_region")]
    pub timed_region: TimedRegion,

    /// Layout of normalized tensors
    #[serde(default = "default_layout")]
    pub layout: TensorLayout,

    #[serde(default = "default_channel_order")]
    pub channel_order: ChannelOrder,

    #[serde(default = "default_resize_filter")]
    pub resize_filter: ResizeFilter,

    #[serde(default = "default_input_height")]
    pub input_height: u32,

    #[serde(default = "default_input_width")]
    pub input_width: u32,

    /// Classes listed per prediction in verbose mode
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Print the report as JSON
    #[serde(default)]
    pub json: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model_path_prefix: default_model_path_prefix(),
            e2e_model_path_prefix: None,
            input_image: default_input_image(),
            input_dir: default_input_dir(),
            num_runs: default_num_runs(),
            batch_size: default_batch_size(),
            warm_up: default_warm_up(),
            use_gpu: false,
            use_batch: false,
            preprocess: None,
            trim: default_trim(),
            timed_region: default_timed_region(),
            layout: default_layout(),
            channel_order: default_channel_order(),
            resize_filter: default_resize_filter(),
            input_height: default_input_height(),
            input_width: default_input_width(),
            top_k: default_top_k(),
            json: false,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl RunConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Device the predictors are constructed on
    pub fn device(&self) -> Device {
        Device::from_gpu_flag(self.use_gpu)
    }

    pub fn run_kind(&self) -> RunKind {
        if self.use_batch {
            RunKind::Batch
        } else {
            RunKind::Single
        }
    }

    /// Total iterations per model, warm-up included
    pub fn total_iterations(&self) -> Result<u32> {
        self.warm_up.checked_add(self.num_runs).ok_or_else(|| {
            AppError::config(format!(
                "Warm-up ({}) plus runs ({}) overflows the iteration counter",
                self.warm_up, self.num_runs
            ))
        })
    }

    /// Models to benchmark, end-to-end first so output matches prior reports
    pub fn variants(&self) -> Vec<(ModelVariant, &str)> {
        let mut variants = Vec::with_capacity(2);
        if let Some(prefix) = &self.e2e_model_path_prefix {
            variants.push((ModelVariant::EndToEnd, prefix.as_str()));
        }
        variants.push((ModelVariant::NonEndToEnd, self.model_path_prefix.as_str()));
        variants
    }

    /// Preprocessing strategy for a model variant in the configured run kind
    pub fn preprocess_for(&self, variant: ModelVariant) -> PreprocessKind {
        match variant {
            ModelVariant::EndToEnd => PreprocessKind::Identity,
            ModelVariant::NonEndToEnd => match (self.preprocess, self.run_kind()) {
                (Some(kind), _) => kind,
                (None, RunKind::Single) => PreprocessKind::ResizeNormalize,
                (None, RunKind::Batch) => PreprocessKind::BatchedResizeNormalize,
            },
        }
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.model_path_prefix.trim().is_empty() {
            return Err(AppError::config("Model path prefix cannot be empty"));
        }

        if let Some(prefix) = &self.e2e_model_path_prefix {
            if prefix.trim().is_empty() {
                return Err(AppError::config("E2E model path prefix cannot be empty"));
            }
        }

        if self.num_runs == 0 {
            return Err(AppError::config("Number of runs must be greater than 0"));
        }

        if self.num_runs > defaults::MAX_NUM_RUNS {
            return Err(AppError::config(format!(
                "Number of runs cannot exceed {}",
                defaults::MAX_NUM_RUNS
            )));
        }

        if self.warm_up > defaults::MAX_WARM_UP {
            return Err(AppError::config(format!(
                "Warm-up runs cannot exceed {}",
                defaults::MAX_WARM_UP
            )));
        }

        if self.batch_size == 0 {
            return Err(AppError::config("Batch size must be greater than 0"));
        }

        if self.batch_size > defaults::MAX_BATCH_SIZE {
            return Err(AppError::config(format!(
                "Batch size cannot exceed {}",
                defaults::MAX_BATCH_SIZE
            )));
        }

        for (name, value) in [("height", self.input_height), ("width", self.input_width)] {
            if value == 0 || value > defaults::MAX_INPUT_DIMENSION {
                return Err(AppError::config(format!(
                    "Input {} must be between 1 and {}, got {}",
                    name,
                    defaults::MAX_INPUT_DIMENSION,
                    value
                )));
            }
        }

        if self.top_k == 0 {
            return Err(AppError::config("top-k must be greater than 0"));
        }

        if self.use_batch && self.input_dir.trim().is_empty() {
            return Err(AppError::config("Batch inference requires an input directory"));
        }

        if !self.use_batch && self.input_image.trim().is_empty() {
            return Err(AppError::config("Single inference requires an input image"));
        }

        if self.use_batch
            && self.batch_size > 1
            && self.preprocess == Some(PreprocessKind::ResizeNormalize)
        {
            return Err(AppError::config(
                "resize-normalize handles one image at a time; use batched-resize-normalize for batch sizes above 1",
            ));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(gpu) = std::env::var(defaults::GPU_ENV_VAR) {
            // Only the literal value 1 selects the GPU
            self.use_gpu = gpu.trim().parse::<i64>().map(|v| v == 1).unwrap_or(false);
        }

        if let Ok(num_runs) = std::env::var("BENCH_NUM_RUNS") {
            self.num_runs = num_runs.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid BENCH_NUM_RUNS value '{}': {}", num_runs, e)))?;
        }

        if let Ok(warm_up) = std::env::var("BENCH_WARM_UP") {
            self.warm_up = warm_up.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid BENCH_WARM_UP value '{}': {}", warm_up, e)))?;
        }

        if let Ok(batch_size) = std::env::var("BENCH_BATCH_SIZE") {
            self.batch_size = batch_size.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid BENCH_BATCH_SIZE value '{}': {}", batch_size, e)))?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_model_path_prefix() -> String {
    defaults::DEFAULT_MODEL_PATH_PREFIX.to_string()
}

fn default_input_image() -> String {
    defaults::DEFAULT_INPUT_IMAGE.to_string()
}

fn default_input_dir() -> String {
    defaults::DEFAULT_INPUT_DIR.to_string()
}

fn default_num_runs() -> u32 {
    defaults::DEFAULT_NUM_RUNS
}

fn default_batch_size() -> u32 {
    defaults::DEFAULT_BATCH_SIZE
}

fn default_warm_up() -> u32 {
    defaults::DEFAULT_WARM_UP
}

fn default_trim() -> TrimStrategy {
    TrimStrategy::None
}

fn default_timed_region() -> TimedRegion {
    TimedRegion::Predict
}

fn default_layout() -> TensorLayout {
    TensorLayout::Nchw
}

fn default_channel_order() -> ChannelOrder {
    ChannelOrder::Rgb
}

fn default_resize_filter() -> ResizeFilter {
    ResizeFilter::Bilinear
}

fn default_input_height() -> u32 {
    defaults::DEFAULT_INPUT_HEIGHT
}

fn default_input_width() -> u32 {
    defaults::DEFAULT_INPUT_WIDTH
}

fn default_top_k() -> usize {
    defaults::DEFAULT_TOP_K
}

fn default_enable_color() -> bool {
    defaults::DEFAULT_ENABLE_COLOR
}
