use thiserror::Error;

use crate::dtype::DType;

/// Failures raised by tensor construction, views, and kernels.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TensorError {
    #[error("tensor data length ({len}) does not match shape {sizes:?}")]
    DataLength { len: usize, sizes: Vec<usize> },
    #[error("dimension out of range (expected to be in range of [{min}, {max}], but got {dim})")]
    DimOutOfRange { dim: i64, min: i64, max: i64 },
    #[error("shape mismatch: {0}")]
    Shape(String),
    #[error("index out of range: {0}")]
    Index(String),
    #[error("{op} does not support dtype {dtype:?}")]
    UnsupportedDType { op: &'static str, dtype: DType },
    #[error("invalid argument to {op}: {reason}")]
    InvalidArgument { op: &'static str, reason: String },
}

impl TensorError {
    pub fn shape(message: impl Into<String>) -> Self {
        TensorError::Shape(message.into())
    }

    pub fn invalid(op: &'static str, reason: impl Into<String>) -> Self {
        TensorError::InvalidArgument {
            op,
            reason: reason.into(),
        }
    }
}

/// Convenience alias for results returned by tensor routines.
pub type TensorResult<T> = Result<T, TensorError>;
