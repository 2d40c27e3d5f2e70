//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Device a predictor is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Gpu,
}

impl Device {
    pub fn from_gpu_flag(use_gpu: bool) -> Self {
        if use_gpu {
            Self::Gpu
        } else {
            Self::Cpu
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Gpu => write!(f, "gpu"),
        }
    }
}

/// Memory layout of an image tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum TensorLayout {
    /// Batch, height, width, channels
    #[value(name = "nhwc")]
    Nhwc,
    /// Batch, channels, height, width
    #[value(name = "nchw")]
    Nchw,
}

impl fmt::Display for TensorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nhwc => write!(f, "NHWC"),
            Self::Nchw => write!(f, "NCHW"),
        }
    }
}

/// Element type of an image tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    U8,
    F32,
}

impl ElementType {
    pub fn size_of(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::F32 => 4,
        }
    }
}

/// Whether a model carries its own preprocessing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVariant {
    /// Preprocessing is fused into the model graph
    EndToEnd,
    /// Preprocessing runs on the host before inference
    NonEndToEnd,
}

impl ModelVariant {
    /// Section header used in benchmark output
    pub fn header(&self) -> &'static str {
        match self {
            Self::EndToEnd => "E2E",
            Self::NonEndToEnd => "Non E2E",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Single-image or batched inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Single,
    Batch,
}

impl RunKind {
    /// Metric prefix used on every statistics line
    pub fn metrics_prefix(&self) -> &'static str {
        match self {
            Self::Single => "single_inference",
            Self::Batch => "batch_inference",
        }
    }
}

/// Preprocessing strategy applied before the predictor is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PreprocessKind {
    /// Raw u8 pixels, NHWC, for models with fused preprocessing
    Identity,
    /// One image resized and normalized
    ResizeNormalize,
    /// Each image of a batch resized, normalized and stacked
    BatchedResizeNormalize,
}

impl fmt::Display for PreprocessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::ResizeNormalize => write!(f, "resize-normalize"),
            Self::BatchedResizeNormalize => write!(f, "batched-resize-normalize"),
        }
    }
}

/// How retained samples are trimmed before statistics are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TrimStrategy {
    /// Keep every retained sample
    None,
    /// Drop the first and the last sample when more than two remain
    HeadTail,
}

impl fmt::Display for TrimStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::HeadTail => write!(f, "head-tail"),
        }
    }
}

/// Part of an iteration a timing sample covers
///
/// Image decoding and plan compilation are never timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TimedRegion {
    /// Only the predictor call
    Predict,
    /// Host preprocessing followed by the predictor call
    PreprocessAndPredict,
}

impl TimedRegion {
    /// Sample duration from the measured phases of one iteration
    pub fn span(&self, preprocess: Duration, predict: Duration) -> Duration {
        match self {
            Self::Predict => predict,
            Self::PreprocessAndPredict => preprocess.saturating_add(predict),
        }
    }
}

impl fmt::Display for TimedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predict => write!(f, "predict"),
            Self::PreprocessAndPredict => write!(f, "preprocess-and-predict"),
        }
    }
}

/// Interpolation used when resizing to the model's input size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
}

impl ResizeFilter {
    pub fn filter_type(&self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Bilinear => image::imageops::FilterType::Triangle,
        }
    }
}

/// Channel order written into the tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

impl FromStr for Device {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" => Ok(Self::Gpu),
            _ => Err(AppError::parse(format!("Invalid device: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_prefix() {
        assert_eq!(RunKind::Single.metrics_prefix(), "single_inference");
        assert_eq!(RunKind::Batch.metrics_prefix(), "batch_inference");
    }

    #[test]
    fn test_variant_headers() {
        assert_eq!(ModelVariant::EndToEnd.header(), "E2E");
        assert_eq!(ModelVariant::NonEndToEnd.to_string(), "Non E2E");
    }

    #[test]
    fn test_timed_region_span() {
        let preprocess = Duration::from_millis(3);
        let predict = Duration::from_millis(7);
        assert_eq!(TimedRegion::Predict.span(preprocess, predict), predict);
        assert_eq!(
            TimedRegion::PreprocessAndPredict.span(preprocess, predict),
            Duration::from_millis(10)
        );
        assert_eq!(TimedRegion::PreprocessAndPredict.to_string(), "preprocess-and-predict");
    }

    #[test]
    fn test_device_parsing() {
        assert_eq!("GPU".parse::<Device>().unwrap(), Device::Gpu);
        assert_eq!(Device::from_gpu_flag(false), Device::Cpu);
        assert!("tpu".parse::<Device>().is_err());
    }
}
