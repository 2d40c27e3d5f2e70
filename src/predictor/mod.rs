//! Predictor abstraction over the inference runtime
//!
//! A predictor is built once per model with the descriptors of its inputs
//! and a device. Each call to [`Predictor::predict`] runs one forward pass
//! to completion and returns the outputs as host memory, so the time spent
//! inside the call is the full inference latency.

pub mod onnx;

pub use onnx::{resolve_model_path, OnnxPredictor};

use crate::{
    error::{AppError, Result},
    logging::Logger,
    preprocess::ImageTensor,
    types::{Device, ElementType, TensorLayout},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name, shape, element type and layout of one model input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDesc {
    pub name: String,
    pub shape: Vec<usize>,
    pub element_type: ElementType,
    pub layout: TensorLayout,
}

impl DataDesc {
    pub fn new(name: &str, shape: Vec<usize>, element_type: ElementType, layout: TensorLayout) -> Self {
        Self {
            name: name.to_string(),
            shape,
            element_type,
            layout,
        }
    }

    /// Descriptor with the same name and the concrete shape of `tensor`
    pub fn with_tensor_shape(&self, tensor: &ImageTensor) -> Self {
        Self {
            shape: tensor.shape().to_vec(),
            ..self.clone()
        }
    }

    /// Element type and layout must agree; the shape may differ in batch
    /// size or spatial extent and gets its own compiled plan.
    pub fn accepts(&self, tensor: &ImageTensor) -> Result<()> {
        if tensor.element_type() != self.element_type || tensor.layout() != self.layout {
            return Err(AppError::inference(format!(
                "Input '{}' expects {:?} {} but got {:?} {}",
                self.name,
                self.element_type,
                self.layout,
                tensor.element_type(),
                tensor.layout()
            )));
        }
        if tensor.shape().len() != self.shape.len() {
            return Err(AppError::inference(format!(
                "Input '{}' expects rank {} but got shape {:?}",
                self.name,
                self.shape.len(),
                tensor.shape()
            )));
        }
        Ok(())
    }
}

/// Output tensor copied back to host memory as f32
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl OutputTensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    /// One score vector per batch element
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        let row_len = match self.shape.as_slice() {
            [_, rest @ ..] if !rest.is_empty() => rest.iter().product::<usize>(),
            _ => self.data.len(),
        };
        self.data.chunks(row_len.max(1))
    }

    pub fn size_in_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

/// Runs forward passes of one loaded model
pub trait Predictor {
    fn model_path(&self) -> &Path;

    /// Input descriptors the predictor was constructed with
    fn input_descriptors(&self) -> &[DataDesc];

    /// Device the caller asked for
    fn requested_device(&self) -> Device;

    /// Device the forward pass actually runs on
    fn device(&self) -> Device;

    /// Get the predictor ready for inputs of these concrete shapes.
    ///
    /// Called outside the timed region; `predict` must not need to do any
    /// compilation for shapes prepared here.
    fn prepare(&mut self, inputs: &[DataDesc]) -> Result<()>;

    /// Run one forward pass, one tensor per declared input
    fn predict(&mut self, inputs: &[ImageTensor]) -> Result<Vec<OutputTensor>>;
}

/// Owns the tensors of one benchmark iteration and releases them together
pub struct TensorScope<'a> {
    logger: &'a Logger,
    label: String,
    inputs: Vec<ImageTensor>,
    outputs: Vec<OutputTensor>,
}

impl<'a> TensorScope<'a> {
    pub fn new(logger: &'a Logger, label: impl Into<String>) -> Self {
        Self {
            logger,
            label: label.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn hold_inputs(&mut self, inputs: Vec<ImageTensor>) -> &[ImageTensor] {
        let start = self.inputs.len();
        self.inputs.extend(inputs);
        &self.inputs[start..]
    }

    pub fn hold_outputs(&mut self, outputs: Vec<OutputTensor>) -> &[OutputTensor] {
        let start = self.outputs.len();
        self.outputs.extend(outputs);
        &self.outputs[start..]
    }

    pub fn tensor_count(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    pub fn bytes_held(&self) -> usize {
        self.inputs.iter().map(ImageTensor::size_in_bytes).sum::<usize>()
            + self.outputs.iter().map(OutputTensor::size_in_bytes).sum::<usize>()
    }
}

impl Drop for TensorScope<'_> {
    fn drop(&mut self) {
        if self.tensor_count() == 0 {
            return;
        }
        self.logger
            .trace(&format!("Releasing tensors of {}", self.label))
            .field("tensors", self.tensor_count())
            .field("bytes", self.bytes_held())
            .log();
        self.inputs.clear();
        self.outputs.clear();
    }
}
