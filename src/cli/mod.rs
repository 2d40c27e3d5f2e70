//! Command-line interface

use crate::types::{ChannelOrder, PreprocessKind, ResizeFilter, TensorLayout, TimedRegion, TrimStrategy};
use clap::Parser;

/// Inference Latency Benchmark - measures forward-pass latency of image
/// classifiers and compares end-to-end models against host preprocessing
///
/// Options left unset fall back to environment variables (and a `.env`
/// file), then to built-in defaults.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "ilb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Model path prefix (model file, file without `.onnx`, or directory)
    #[arg(long, value_name = "PREFIX")]
    pub model_path_prefix: Option<String>,

    /// Model with fused preprocessing to benchmark against the first one
    #[arg(long, value_name = "PREFIX")]
    pub e2e_model_path_prefix: Option<String>,

    /// Image used for single inference
    #[arg(long, value_name = "FILE")]
    pub input_image: Option<String>,

    /// Directory of images used for batch inference
    #[arg(long, value_name = "DIR")]
    pub input_dir: Option<String>,

    /// Number of measured runs
    #[arg(long)]
    pub num_runs: Option<u32>,

    /// Images per batch
    #[arg(long = "batchsize", value_name = "N")]
    pub batch_size: Option<u32>,

    /// Iterations run before measuring starts [default: 5]
    ///
    /// Older reports discarded no warm-up iterations; pass `--warm-up 0
    /// --trim head-tail` to reproduce their numbers.
    #[arg(long)]
    pub warm_up: Option<u32>,

    /// Run on the GPU (accepts an optional true/false value)
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    pub use_gpu: Option<bool>,

    /// Batch inference over --input-dir (accepts an optional true/false value)
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    pub use_batch: Option<bool>,

    /// Preprocessing applied before inference for non end-to-end models
    #[arg(long, value_enum)]
    pub preprocess: Option<PreprocessKind>,

    /// How measured samples are trimmed before statistics [default: none]
    ///
    /// `head-tail` drops the first and last measured sample, as older
    /// reports did. Combine it with `--warm-up 0` to compare against them.
    #[arg(long, value_enum)]
    pub trim: Option<TrimStrategy>,

    /// Part of each iteration a sample covers [default: predict]
    ///
    /// `predict` times only the forward pass. `preprocess-and-predict` also
    /// times host preprocessing; image decoding is never timed.
    #[arg(long, value_enum)]
    pub timed_region: Option<TimedRegion>,

    /// Input tensor layout for preprocessed inputs
    #[arg(long, value_enum)]
    pub layout: Option<TensorLayout>,

    /// Channel order of preprocessed inputs
    #[arg(long, value_enum)]
    pub channel_order: Option<ChannelOrder>,

    /// Resize interpolation
    #[arg(long, value_enum)]
    pub resize: Option<ResizeFilter>,

    /// Model input height
    #[arg(long)]
    pub input_height: Option<u32>,

    /// Model input width
    #[arg(long)]
    pub input_width: Option<u32>,

    /// Number of classes listed in verbose output
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.num_runs == Some(0) {
            return Err("--num-runs must be greater than 0".to_string());
        }

        if self.batch_size == Some(0) {
            return Err("--batchsize must be greater than 0".to_string());
        }

        if self.top_k == Some(0) {
            return Err("--top-k must be greater than 0".to_string());
        }

        if self.input_dir.is_some() && self.input_image.is_some() && self.use_batch.is_none() {
            return Err(
                "Both --input-image and --input-dir given; pass --use-batch true or false to pick one".to_string(),
            );
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color || self.json {
            false
        } else {
            supports_color()
        }
    }
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}
