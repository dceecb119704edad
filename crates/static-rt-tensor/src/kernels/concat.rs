use super::OutputResolver;
use crate::error::{TensorError, TensorResult};
use crate::tensor::{Dims, Tensor};
use crate::view::wrap_dim;

/// Concatenates `tensors` along `dim`. All other axes must agree.
pub fn cat_out(out: &mut dyn OutputResolver, tensors: &[Tensor], dim: i64) -> TensorResult<()> {
    let first = tensors
        .first()
        .ok_or_else(|| TensorError::invalid("cat", "expected a non-empty list of tensors"))?;
    let rank = first.dim();
    if rank == 0 {
        return Err(TensorError::invalid(
            "cat",
            "zero-dimensional tensor cannot be concatenated",
        ));
    }
    let axis = wrap_dim(dim, rank)?;

    let mut out_sizes = Dims::from_slice(first.sizes());
    out_sizes[axis] = 0;
    for (position, tensor) in tensors.iter().enumerate() {
        if tensor.dim() != rank {
            return Err(TensorError::shape(format!(
                "tensors must have same number of dimensions: got {} and {}",
                rank,
                tensor.dim()
            )));
        }
        for (idx, (size, expected)) in tensor.sizes().iter().zip(first.sizes()).enumerate() {
            if idx != axis && size != expected {
                return Err(TensorError::shape(format!(
                    "sizes of tensors must match except in dimension {}: expected size {} but got size {} for tensor number {} in the list",
                    axis, expected, size, position
                )));
            }
        }
        out_sizes[axis] += tensor.sizes()[axis];
    }

    let inner: usize = out_sizes[axis + 1..].iter().product();
    let outer: usize = out_sizes[..axis].iter().product();

    out.set_output(&out_sizes, None)?;
    let dst = out.output();
    if tensors.iter().all(|tensor| tensor.dtype() == dst.dtype()) {
        let width = dst.dtype().size_in_bytes();
        let parts: Vec<(usize, Vec<u8>)> = tensors
            .iter()
            .map(|tensor| (tensor.sizes()[axis] * inner * width, tensor.to_element_bytes()))
            .collect();
        dst.copy_from_element_bytes(&interleave(outer, &parts))
    } else {
        let parts: Vec<(usize, Vec<f64>)> = tensors
            .iter()
            .map(|tensor| (tensor.sizes()[axis] * inner, tensor.to_f64_vec()))
            .collect();
        dst.copy_from_f64(&interleave(outer, &parts))
    }
}

/// Joins `outer` rows, each made of one `chunk` from every part in order.
fn interleave<T: Copy>(outer: usize, parts: &[(usize, Vec<T>)]) -> Vec<T> {
    let total = parts.iter().map(|(_, data)| data.len()).sum();
    let mut values = Vec::with_capacity(total);
    for outer_idx in 0..outer {
        for (chunk, data) in parts {
            let start = outer_idx * chunk;
            values.extend_from_slice(&data[start..start + chunk]);
        }
    }
    values
}

/// Resizes `dst` in place to the sizes of `src`, keeping its storage.
pub fn resize_as_(dst: &mut Tensor, src: &Tensor) {
    dst.resize_(src.sizes());
}

/// Copies every element of `src` into `dst`; sizes must already match.
pub fn copy_(dst: &mut Tensor, src: &Tensor) -> TensorResult<()> {
    if dst.sizes() != src.sizes() {
        return Err(TensorError::shape(format!(
            "copy_ expects equal sizes, got {:?} and {:?}",
            dst.sizes(),
            src.sizes()
        )));
    }
    dst.copy_elements_from(src)
}
