//! Strided host tensors and the reference kernel library consumed by the static runtime.
//!
//! Tensors are metadata (dtype, sizes, strides, element offset) over a shared, growable
//! [`Storage`]. View operations only rewrite metadata, so several tensors can alias one
//! storage. Kernels in [`kernels`] are out-variants: they receive an
//! [`kernels::OutputResolver`] and decide the destination shape themselves.

pub mod dtype;
pub mod error;
pub mod kernels;
pub mod storage;
mod tensor;
mod view;

pub use dtype::{DType, MemoryFormat};
pub use error::{TensorError, TensorResult};
pub use storage::Storage;
pub use tensor::{contiguous_strides, Dims, Tensor};
pub use view::wrap_dim;
