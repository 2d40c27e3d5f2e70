//! Host-side preprocessing pipelines
//!
//! Models without fused preprocessing expect resized, normalized float
//! tensors; end-to-end models take the decoded pixels as they are. Each
//! strategy turns a slice of decoded images into one batched
//! [`ImageTensor`].

pub mod loader;
pub mod tensor;

pub use loader::{generate_batches, list_images, load_image};
pub use tensor::{ImageTensor, TensorData};

use crate::{
    defaults,
    error::{AppError, Result},
    models::RunConfig,
    types::{ChannelOrder, PreprocessKind, ResizeFilter, TensorLayout},
};
use image::DynamicImage;
use ndarray::{Array3, ArrayView3, Axis};
use std::fmt;

/// Target geometry and normalization constants
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    pub height: u32,
    pub width: u32,
    pub layout: TensorLayout,
    pub channel_order: ChannelOrder,
    pub filter: ResizeFilter,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            height: defaults::DEFAULT_INPUT_HEIGHT,
            width: defaults::DEFAULT_INPUT_WIDTH,
            layout: TensorLayout::Nchw,
            channel_order: ChannelOrder::Rgb,
            filter: ResizeFilter::Bilinear,
            mean: defaults::NORM_MEAN,
            std: defaults::NORM_STD,
        }
    }
}

impl From<&RunConfig> for PreprocessConfig {
    fn from(config: &RunConfig) -> Self {
        Self {
            height: config.input_height,
            width: config.input_width,
            layout: config.layout,
            channel_order: config.channel_order,
            filter: config.resize_filter,
            ..Self::default()
        }
    }
}

impl PreprocessConfig {
    /// RGB channel feeding tensor channel `c`
    fn source_channel(&self, c: usize) -> usize {
        match self.channel_order {
            ChannelOrder::Rgb => c,
            ChannelOrder::Bgr => 2 - c,
        }
    }
}

/// Resize and normalize one image into a rank 3 array in the configured layout.
///
/// Each channel is scaled to `[0, 1]`, then shifted by its mean and divided
/// by its standard deviation. Mean and std follow the source RGB channel, so
/// BGR output only changes the placement.
pub fn normalize_image(image: &DynamicImage, config: &PreprocessConfig) -> Array3<f32> {
    let resized = image::imageops::resize(
        &image.to_rgb8(),
        config.width,
        config.height,
        config.filter.filter_type(),
    );
    let (h, w) = (config.height as usize, config.width as usize);

    let value = |y: usize, x: usize, c: usize| {
        let src = config.source_channel(c);
        let pixel = resized.get_pixel(x as u32, y as u32)[src] as f32 / 255.0;
        (pixel - config.mean[src]) / config.std[src]
    };

    match config.layout {
        TensorLayout::Nchw => Array3::from_shape_fn((3, h, w), |(c, y, x)| value(y, x, c)),
        TensorLayout::Nhwc => Array3::from_shape_fn((h, w, 3), |(y, x, c)| value(y, x, c)),
    }
}

/// Invert [`normalize_image`] back to 8-bit pixels in the same layout
pub fn denormalize(array: ArrayView3<'_, f32>, config: &PreprocessConfig) -> Array3<u8> {
    let channel_axis = match config.layout {
        TensorLayout::Nchw => 0,
        TensorLayout::Nhwc => 2,
    };

    let mut out = Array3::<u8>::zeros(array.raw_dim());
    for (index, &v) in array.indexed_iter() {
        let c = match channel_axis {
            0 => index.0,
            _ => index.2,
        };
        let src = config.source_channel(c);
        let pixel = (v * config.std[src] + config.mean[src]) * 255.0;
        out[index] = pixel.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Decoded RGB pixels as an `H x W x 3` array
pub fn raw_pixels(image: &DynamicImage) -> Result<Array3<u8>> {
    let rgb = image.to_rgb8();
    let (w, h) = rgb.dimensions();
    Ok(Array3::from_shape_vec((h as usize, w as usize, 3), rgb.into_raw())?)
}

/// Turns decoded images into a model input tensor
pub trait Preprocessor: Send + Sync + fmt::Debug {
    fn kind(&self) -> PreprocessKind;

    /// Build the batched input tensor; `Ok(None)` when there is nothing to run
    fn prepare(&self, images: &[DynamicImage]) -> Result<Option<ImageTensor>>;
}

/// Raw u8 NHWC pixels for models with fused preprocessing
#[derive(Debug, Default, Clone)]
pub struct IdentityPreprocessor;

impl Preprocessor for IdentityPreprocessor {
    fn kind(&self) -> PreprocessKind {
        PreprocessKind::Identity
    }

    fn prepare(&self, images: &[DynamicImage]) -> Result<Option<ImageTensor>> {
        let tensors = images
            .iter()
            .map(|image| {
                let pixels = raw_pixels(image)?.insert_axis(Axis(0)).into_dyn();
                ImageTensor::from_u8_array(pixels, TensorLayout::Nhwc)
            })
            .collect::<Result<Vec<_>>>()?;
        ImageTensor::concat(&tensors)
    }
}

/// Resize and normalize exactly one image
#[derive(Debug, Clone)]
pub struct ResizeNormalizePreprocessor {
    config: PreprocessConfig,
}

impl ResizeNormalizePreprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }
}

impl Preprocessor for ResizeNormalizePreprocessor {
    fn kind(&self) -> PreprocessKind {
        PreprocessKind::ResizeNormalize
    }

    fn prepare(&self, images: &[DynamicImage]) -> Result<Option<ImageTensor>> {
        match images {
            [] => Ok(None),
            [image] => {
                let array = normalize_image(image, &self.config).insert_axis(Axis(0)).into_dyn();
                Ok(Some(ImageTensor::from_f32_array(array, self.config.layout)?))
            }
            _ => Err(AppError::validation(format!(
                "{} preprocessing takes one image, got {}; use {}",
                PreprocessKind::ResizeNormalize,
                images.len(),
                PreprocessKind::BatchedResizeNormalize
            ))),
        }
    }
}

/// Resize and normalize every image of a batch, then stack them
#[derive(Debug, Clone)]
pub struct BatchedResizeNormalizePreprocessor {
    config: PreprocessConfig,
}

impl BatchedResizeNormalizePreprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }
}

impl Preprocessor for BatchedResizeNormalizePreprocessor {
    fn kind(&self) -> PreprocessKind {
        PreprocessKind::BatchedResizeNormalize
    }

    fn prepare(&self, images: &[DynamicImage]) -> Result<Option<ImageTensor>> {
        if images.is_empty() {
            return Ok(None);
        }
        let normalized: Vec<Array3<f32>> = images
            .iter()
            .map(|image| normalize_image(image, &self.config))
            .collect();
        let views: Vec<ArrayView3<'_, f32>> = normalized.iter().map(|a| a.view()).collect();
        let batch = ndarray::stack(Axis(0), &views)?.into_dyn();
        Ok(Some(ImageTensor::from_f32_array(batch, self.config.layout)?))
    }
}

pub fn create_preprocessor(kind: PreprocessKind, config: PreprocessConfig) -> Box<dyn Preprocessor> {
    match kind {
        PreprocessKind::Identity => Box::new(IdentityPreprocessor),
        PreprocessKind::ResizeNormalize => Box::new(ResizeNormalizePreprocessor::new(config)),
        PreprocessKind::BatchedResizeNormalize => {
            Box::new(BatchedResizeNormalizePreprocessor::new(config))
        }
    }
}
