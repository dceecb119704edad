//! Reference out-variant kernels.
//!
//! Every kernel computes its result shape, announces it through an [`OutputResolver`], and
//! then writes into the resolved destination. Callers decide how the destination storage is
//! managed by choosing the resolver; kernels never allocate the destination themselves.

mod concat;
mod linalg;
mod pointwise;

pub use concat::{cat_out, copy_, resize_as_};
pub use linalg::{addmm_out, bmm_out};
pub use pointwise::{
    add_out, clamp_out, leaky_relu_out, logit_out, mul_out, nan_to_num_out, relu_out,
    sigmoid_out, tanh_out, threshold_out,
};

use smallvec::smallvec;

use crate::error::{TensorError, TensorResult};
use crate::tensor::{Dims, Tensor};

/// Destination hook handed to kernels.
///
/// `set_output` is called exactly once per kernel invocation with the result geometry;
/// `output` then yields the tensor to write into.
pub trait OutputResolver {
    fn set_output(&mut self, sizes: &[usize], strides: Option<&[usize]>) -> TensorResult<()>;
    fn output(&mut self) -> &mut Tensor;
}

/// Resolver that unconditionally resizes the destination to the requested geometry.
pub struct ResizingOutput<'t> {
    tensor: &'t mut Tensor,
}

impl<'t> ResizingOutput<'t> {
    pub fn new(tensor: &'t mut Tensor) -> Self {
        ResizingOutput { tensor }
    }
}

impl OutputResolver for ResizingOutput<'_> {
    fn set_output(&mut self, sizes: &[usize], strides: Option<&[usize]>) -> TensorResult<()> {
        self.tensor.resize_(sizes);
        if let Some(strides) = strides {
            self.tensor.as_strided_(sizes, strides)?;
        }
        Ok(())
    }

    fn output(&mut self) -> &mut Tensor {
        &mut *self.tensor
    }
}

/// Resolver that leaves the destination untouched when it already has the requested
/// dense geometry and only resizes otherwise.
pub struct CapacityAwareOutput<'t> {
    tensor: &'t mut Tensor,
}

impl<'t> CapacityAwareOutput<'t> {
    pub fn new(tensor: &'t mut Tensor) -> Self {
        CapacityAwareOutput { tensor }
    }
}

impl OutputResolver for CapacityAwareOutput<'_> {
    fn set_output(&mut self, sizes: &[usize], strides: Option<&[usize]>) -> TensorResult<()> {
        let same_geometry = self.tensor.sizes() == sizes
            && match strides {
                Some(strides) => self.tensor.strides() == strides,
                None => self.tensor.is_contiguous(),
            };
        if same_geometry {
            return Ok(());
        }
        ResizingOutput::new(&mut *self.tensor).set_output(sizes, strides)
    }

    fn output(&mut self) -> &mut Tensor {
        &mut *self.tensor
    }
}

/// Numpy-style broadcast of two shapes.
pub(crate) fn broadcast_shapes(lhs: &[usize], rhs: &[usize]) -> TensorResult<Dims> {
    let rank = lhs.len().max(rhs.len());
    let mut out: Dims = smallvec![0; rank];
    for axis in 0..rank {
        let l = axis_from_right(lhs, rank, axis);
        let r = axis_from_right(rhs, rank, axis);
        out[axis] = match (l, r) {
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            (a, b) => {
                return Err(TensorError::shape(format!(
                    "the size of tensor a ({}) must match the size of tensor b ({}) at non-singleton dimension {}",
                    a, b, axis
                )));
            }
        };
    }
    Ok(out)
}

fn axis_from_right(shape: &[usize], rank: usize, axis: usize) -> usize {
    let lead = rank - shape.len();
    if axis < lead {
        1
    } else {
        shape[axis - lead]
    }
}

/// Values of `tensor` broadcast to `sizes`, in row-major order.
pub(crate) fn broadcast_values(tensor: &Tensor, sizes: &[usize]) -> TensorResult<Vec<f64>> {
    if tensor.sizes() == sizes {
        return Ok(tensor.to_f64_vec());
    }
    Ok(tensor.expand(sizes)?.to_f64_vec())
}

/// Writes dense `values` of geometry `sizes` through `out`.
pub(crate) fn emit(
    out: &mut dyn OutputResolver,
    sizes: &[usize],
    values: &[f64],
) -> TensorResult<()> {
    out.set_output(sizes, None)?;
    out.output().copy_from_f64(values)
}
