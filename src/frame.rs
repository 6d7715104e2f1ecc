use crate::foundation::error::{TpdneError, TpdneResult};

/// Element storage of a [`Frame`], row-major and tightly packed.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameData {
    /// Raw 8-bit values, passed through unscaled.
    U8(Vec<u8>),
    /// Floats in `[0, 1]` or `[-1, 1]`.
    F32(Vec<f32>),
    /// Floats in `[0, 1]` or `[-1, 1]`.
    F64(Vec<f64>),
}

impl FrameData {
    /// Number of stored elements.
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    /// Whether no elements are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A sampled image tensor of arbitrary layout.
///
/// A frame only guarantees that its shape and data agree in length; interpreting the axes is
/// the job of [`crate::normalize`].
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    shape: Vec<usize>,
    data: FrameData,
}

impl Frame {
    /// Build a frame, checking that `shape` covers exactly `data.len()` elements.
    pub fn new(shape: impl Into<Vec<usize>>, data: FrameData) -> TpdneResult<Self> {
        let shape = shape.into();
        if shape.is_empty() {
            return Err(TpdneError::shape("frame shape must have at least one axis"));
        }
        let expected = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| TpdneError::shape(format!("frame shape {shape:?} overflows usize")))?;
        if expected != data.len() {
            return Err(TpdneError::shape(format!(
                "frame shape {shape:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn from_u8(shape: impl Into<Vec<usize>>, data: Vec<u8>) -> TpdneResult<Self> {
        Self::new(shape, FrameData::U8(data))
    }

    pub fn from_f32(shape: impl Into<Vec<usize>>, data: Vec<f32>) -> TpdneResult<Self> {
        Self::new(shape, FrameData::F32(data))
    }

    pub fn from_f64(shape: impl Into<Vec<usize>>, data: Vec<f64>) -> TpdneResult<Self> {
        Self::new(shape, FrameData::F64(data))
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &FrameData {
        &self.data
    }
}
