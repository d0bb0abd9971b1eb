use crate::{DType, Device};

/// Errors raised by the tensor layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    #[error("Shape {shape:?} of {dtype} is too large to address")]
    ShapeOverflow { shape: Vec<usize>, dtype: DType },

    #[error("Cannot reshape tensor with {numel} elements into {shape:?}")]
    InvalidReshape { numel: usize, shape: Vec<isize> },

    #[error("Axis {axis} out of range for {ndim}-D tensor")]
    InvalidAxis { axis: usize, ndim: usize },

    #[error("Invalid slice: {0}")]
    InvalidSlice(String),

    #[error("Operation requires a contiguous tensor")]
    NonContiguous,

    #[error("DType mismatch: tensor is {expected}, accessed as {got}")]
    DTypeMismatch { expected: DType, got: DType },

    #[error("Index {index:?} out of bounds for shape {shape:?}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Vec<usize> },

    #[error("Device {0} is not available")]
    DeviceUnavailable(Device),

    #[error("Invalid device string '{0}' (expected e.g. \"CPU:0\" or \"CUDA:1\")")]
    ParseDevice(String),

    #[error("Unknown dtype '{0}'")]
    ParseDType(String),
}
