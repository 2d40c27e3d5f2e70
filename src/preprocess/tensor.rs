//! Dense image tensors handed to predictors

use crate::{
    error::{AppError, Result},
    types::{Device, ElementType, TensorLayout},
};
use ndarray::{ArrayD, Axis, IxDyn};

/// Element storage of an [`ImageTensor`]
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    U8(Vec<u8>),
    F32(Vec<f32>),
}

impl TensorData {
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Self::U8(_) => ElementType::U8,
            Self::F32(_) => ElementType::F32,
        }
    }
}

/// Pixel tensor with a leading batch axis and a layout tag.
///
/// Shapes are always rank 4: `[N, C, H, W]` for NCHW, `[N, H, W, C]` for NHWC.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: TensorData,
    shape: Vec<usize>,
    layout: TensorLayout,
    device: Option<Device>,
}

impl ImageTensor {
    pub fn new(data: TensorData, shape: Vec<usize>, layout: TensorLayout) -> Result<Self> {
        if shape.len() != 4 {
            return Err(AppError::image(format!(
                "Image tensors must have rank 4, got shape {:?}",
                shape
            )));
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(AppError::image(format!(
                "Shape {:?} needs {} elements but {} were provided",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            data,
            shape,
            layout,
            device: None,
        })
    }

    pub fn from_f32_array(array: ArrayD<f32>, layout: TensorLayout) -> Result<Self> {
        let shape = array.shape().to_vec();
        let data = array.iter().copied().collect();
        Self::new(TensorData::F32(data), shape, layout)
    }

    pub fn from_u8_array(array: ArrayD<u8>, layout: TensorLayout) -> Result<Self> {
        let shape = array.shape().to_vec();
        let data = array.iter().copied().collect();
        Self::new(TensorData::U8(data), shape, layout)
    }

    /// Concatenate tensors along the batch axis.
    ///
    /// Returns `Ok(None)` for an empty slice so callers can skip empty batches.
    pub fn concat(tensors: &[ImageTensor]) -> Result<Option<Self>> {
        let first = match tensors.first() {
            Some(first) => first,
            None => return Ok(None),
        };

        for tensor in &tensors[1..] {
            if tensor.layout != first.layout
                || tensor.element_type() != first.element_type()
                || tensor.shape[1..] != first.shape[1..]
            {
                return Err(AppError::image(format!(
                    "Cannot batch a {} {:?} {:?} tensor with a {} {:?} {:?} tensor",
                    first.layout,
                    first.element_type(),
                    first.shape,
                    tensor.layout,
                    tensor.element_type(),
                    tensor.shape
                )));
            }
        }

        let tensor = match first.data {
            TensorData::F32(_) => {
                let views = tensors
                    .iter()
                    .map(|t| t.as_f32_view())
                    .collect::<Result<Vec<_>>>()?;
                let joined = ndarray::concatenate(Axis(0), &views)?;
                Self::from_f32_array(joined, first.layout)?
            }
            TensorData::U8(_) => {
                let views = tensors
                    .iter()
                    .map(|t| t.as_u8_view())
                    .collect::<Result<Vec<_>>>()?;
                let joined = ndarray::concatenate(Axis(0), &views)?;
                Self::from_u8_array(joined, first.layout)?
            }
        };
        Ok(Some(tensor))
    }

    fn as_f32_view(&self) -> Result<ndarray::ArrayViewD<'_, f32>> {
        match &self.data {
            TensorData::F32(v) => Ok(ndarray::ArrayViewD::from_shape(IxDyn(&self.shape), v)?),
            TensorData::U8(_) => Err(AppError::image("Expected an f32 tensor")),
        }
    }

    fn as_u8_view(&self) -> Result<ndarray::ArrayViewD<'_, u8>> {
        match &self.data {
            TensorData::U8(v) => Ok(ndarray::ArrayViewD::from_shape(IxDyn(&self.shape), v)?),
            TensorData::F32(_) => Err(AppError::image("Expected a u8 tensor")),
        }
    }

    /// Override the device this tensor should be placed on before inference
    pub fn as_in_context(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    pub fn device(&self) -> Option<Device> {
        self.device
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn layout(&self) -> TensorLayout {
        self.layout
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    pub fn batch_size(&self) -> usize {
        self.shape[0]
    }

    pub fn size_in_bytes(&self) -> usize {
        self.data.len() * self.element_type().size_of()
    }
}
