//! ONNX predictor backed by tract

use super::{DataDesc, OutputTensor, Predictor};
use crate::{
    error::{AppError, Result},
    preprocess::{ImageTensor, TensorData},
    types::{Device, ElementType},
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;

type OnnxPlan = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Locate the model file of a path prefix.
///
/// Tries `<prefix>` itself, then `<prefix>.onnx`, then `<prefix>/model.onnx`.
pub fn resolve_model_path(prefix: &str) -> Result<PathBuf> {
    let base = PathBuf::from(prefix);
    let candidates = [
        base.clone(),
        PathBuf::from(format!("{}.onnx", prefix)),
        base.join("model.onnx"),
    ];
    candidates.into_iter().find(|p| p.is_file()).ok_or_else(|| {
        AppError::model(format!(
            "No model found for prefix '{}' (tried {p}, {p}.onnx and {p}/model.onnx)",
            prefix,
            p = prefix
        ))
    })
}

/// Predictor running an ONNX graph on tract's CPU executor
pub struct OnnxPredictor {
    model_path: PathBuf,
    model: InferenceModel,
    descriptors: Vec<DataDesc>,
    requested_device: Device,
    /// One optimized plan per set of concrete input shapes
    plans: HashMap<Vec<Vec<usize>>, OnnxPlan>,
}

impl OnnxPredictor {
    /// Load and parse the model of `prefix`; plans are compiled by `prepare`
    pub fn new(prefix: &str, descriptors: Vec<DataDesc>, device: Device) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(AppError::model("A predictor needs at least one input descriptor"));
        }

        let model_path = resolve_model_path(prefix)?;
        let model = tract_onnx::onnx().model_for_path(&model_path).map_err(|e| {
            AppError::model(format!("Failed to load {}: {:#}", model_path.display(), e))
        })?;

        Ok(Self {
            model_path,
            model,
            descriptors,
            requested_device: device,
            plans: HashMap::new(),
        })
    }

    /// Number of compiled plans
    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }

    fn compile(&self, inputs: &[DataDesc]) -> Result<OnnxPlan> {
        let mut model = self.model.clone();
        for (index, desc) in inputs.iter().enumerate() {
            let fact: InferenceFact = match desc.element_type {
                ElementType::U8 => u8::fact(desc.shape.clone()).into(),
                ElementType::F32 => f32::fact(desc.shape.clone()).into(),
            };
            model = model.with_input_fact(index, fact).map_err(|e| self.model_error(desc, e))?;
        }

        model
            .into_optimized()
            .and_then(|optimized| optimized.into_runnable())
            .map_err(|e| AppError::model(format!(
                "Failed to optimize {} for shapes {:?}: {:#}",
                self.model_path.display(),
                inputs.iter().map(|d| &d.shape).collect::<Vec<_>>(),
                e
            )))
    }

    fn model_error(&self, desc: &DataDesc, error: anyhow::Error) -> AppError {
        AppError::model(format!(
            "Model {} rejects input '{}' with shape {:?}: {:#}",
            self.model_path.display(),
            desc.name,
            desc.shape,
            error
        ))
    }

    fn to_tract(tensor: &ImageTensor) -> Result<Tensor> {
        let converted = match tensor.data() {
            TensorData::F32(v) => Tensor::from_shape::<f32>(tensor.shape(), v),
            TensorData::U8(v) => Tensor::from_shape::<u8>(tensor.shape(), v),
        };
        converted.map_err(|e| AppError::inference(format!("Failed to build input tensor: {:#}", e)))
    }

    fn from_tract(value: &TValue) -> Result<OutputTensor> {
        let as_f32 = value
            .cast_to::<f32>()
            .map_err(|e| AppError::inference(format!("Model output is not numeric: {:#}", e)))?;
        let data = as_f32
            .as_slice::<f32>()
            .map_err(|e| AppError::inference(format!("Failed to read model output: {:#}", e)))?
            .to_vec();
        Ok(OutputTensor::new(as_f32.shape().to_vec(), data))
    }
}

impl Predictor for OnnxPredictor {
    fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn input_descriptors(&self) -> &[DataDesc] {
        &self.descriptors
    }

    fn requested_device(&self) -> Device {
        self.requested_device
    }

    fn device(&self) -> Device {
        Device::Cpu
    }

    fn prepare(&mut self, inputs: &[DataDesc]) -> Result<()> {
        let key: Vec<Vec<usize>> = inputs.iter().map(|d| d.shape.clone()).collect();
        if !self.plans.contains_key(&key) {
            let plan = self.compile(inputs)?;
            self.plans.insert(key, plan);
        }
        Ok(())
    }

    fn predict(&mut self, inputs: &[ImageTensor]) -> Result<Vec<OutputTensor>> {
        if inputs.len() != self.descriptors.len() {
            return Err(AppError::inference(format!(
                "Model {} takes {} input(s), got {}",
                self.model_path.display(),
                self.descriptors.len(),
                inputs.len()
            )));
        }
        for (desc, tensor) in self.descriptors.iter().zip(inputs) {
            desc.accepts(tensor)?;
        }

        let key: Vec<Vec<usize>> = inputs.iter().map(|t| t.shape().to_vec()).collect();
        if !self.plans.contains_key(&key) {
            let shapes: Vec<DataDesc> = self
                .descriptors
                .iter()
                .zip(inputs)
                .map(|(desc, tensor)| desc.with_tensor_shape(tensor))
                .collect();
            self.prepare(&shapes)?;
        }
        let plan = self
            .plans
            .get(&key)
            .ok_or_else(|| AppError::internal("Compiled plan missing from cache"))?;

        let values: TVec<TValue> = inputs
            .iter()
            .map(|t| Self::to_tract(t).map(TValue::from))
            .collect::<Result<_>>()?;
        let outputs = plan
            .run(values)
            .map_err(|e| AppError::inference(format!("Forward pass failed: {:#}", e)))?;

        outputs.iter().map(Self::from_tract).collect()
    }
}
