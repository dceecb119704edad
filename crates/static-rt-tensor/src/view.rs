//! Metadata-only view operations and dtype/layout conversion.

use smallvec::smallvec;

use crate::dtype::{DType, MemoryFormat};
use crate::error::{TensorError, TensorResult};
use crate::tensor::{contiguous_strides, Dims, Tensor};

/// Normalizes a possibly negative axis index against `rank`.
///
/// Zero-dimensional tensors accept `0` and `-1`, mirroring the usual scalar convention.
pub fn wrap_dim(dim: i64, rank: usize) -> TensorResult<usize> {
    let rank = rank.max(1) as i64;
    let min = -rank;
    let max = rank - 1;
    if dim < min || dim > max {
        return Err(TensorError::DimOutOfRange { dim, min, max });
    }
    let wrapped = if dim < 0 { dim + rank } else { dim };
    Ok(wrapped as usize)
}

impl Tensor {
    /// Swaps two axes.
    pub fn transpose(&self, dim0: i64, dim1: i64) -> TensorResult<Tensor> {
        if self.dim() == 0 {
            wrap_dim(dim0, 0)?;
            wrap_dim(dim1, 0)?;
            return Ok(self.clone());
        }
        let a = wrap_dim(dim0, self.dim())?;
        let b = wrap_dim(dim1, self.dim())?;
        let mut sizes = Dims::from_slice(self.sizes());
        let mut strides = Dims::from_slice(self.strides());
        sizes.swap(a, b);
        strides.swap(a, b);
        Ok(self.alias_with(sizes, strides, self.storage_offset()))
    }

    /// Reorders axes according to `dims`, which must be a permutation of `0..rank`.
    pub fn permute(&self, dims: &[i64]) -> TensorResult<Tensor> {
        if dims.len() != self.dim() {
            return Err(TensorError::shape(format!(
                "permute: number of dims don't match ({} vs {})",
                dims.len(),
                self.dim()
            )));
        }
        let mut seen = vec![false; self.dim()];
        let mut sizes = Dims::with_capacity(dims.len());
        let mut strides = Dims::with_capacity(dims.len());
        for dim in dims {
            let axis = wrap_dim(*dim, self.dim())?;
            if seen[axis] {
                return Err(TensorError::invalid("permute", "repeated dim"));
            }
            seen[axis] = true;
            sizes.push(self.sizes()[axis]);
            strides.push(self.strides()[axis]);
        }
        Ok(self.alias_with(sizes, strides, self.storage_offset()))
    }

    /// Inserts a size-one axis at `dim`.
    pub fn unsqueeze(&self, dim: i64) -> TensorResult<Tensor> {
        let axis = wrap_dim(dim, self.dim() + 1)?;
        let mut sizes = Dims::from_slice(self.sizes());
        let mut strides = Dims::from_slice(self.strides());
        let stride = if axis < self.dim() {
            sizes[axis] * strides[axis]
        } else {
            1
        };
        sizes.insert(axis, 1);
        strides.insert(axis, stride);
        Ok(self.alias_with(sizes, strides, self.storage_offset()))
    }

    /// Broadcasts to `sizes` by giving expanded axes a zero stride.
    pub fn expand(&self, sizes: &[usize]) -> TensorResult<Tensor> {
        if sizes.len() < self.dim() {
            return Err(TensorError::shape(format!(
                "cannot expand {:?} to fewer dimensions {:?}",
                self.sizes(),
                sizes
            )));
        }
        let lead = sizes.len() - self.dim();
        let mut strides: Dims = smallvec![0; sizes.len()];
        for (axis, target) in sizes.iter().enumerate().skip(lead) {
            let size = self.sizes()[axis - lead];
            if size == *target {
                strides[axis] = self.strides()[axis - lead];
            } else if size != 1 {
                return Err(TensorError::shape(format!(
                    "the expanded size {} must match the existing size {} at dimension {}",
                    target, size, axis
                )));
            }
        }
        Ok(self.alias_with(Dims::from_slice(sizes), strides, self.storage_offset()))
    }

    /// Strided slice `[start, end)` with `step` along `dim`.
    ///
    /// `None` bounds are open; negative bounds count from the end and are clamped.
    pub fn slice(
        &self,
        dim: i64,
        start: Option<i64>,
        end: Option<i64>,
        step: i64,
    ) -> TensorResult<Tensor> {
        if self.dim() == 0 {
            return Err(TensorError::invalid("slice", "cannot be applied to a 0-dim tensor"));
        }
        if step <= 0 {
            return Err(TensorError::invalid("slice", "step must be positive"));
        }
        let axis = wrap_dim(dim, self.dim())?;
        let size = self.sizes()[axis] as i64;
        let mut start = start.unwrap_or(0);
        let mut end = end.unwrap_or(i64::MAX);
        if start < 0 {
            start += size;
        }
        if end < 0 {
            end += size;
        }
        let start = start.clamp(0, size);
        let end = end.clamp(start, size);
        let len = if end > start {
            (end - start - 1) / step + 1
        } else {
            0
        };

        let mut sizes = Dims::from_slice(self.sizes());
        let mut strides = Dims::from_slice(self.strides());
        let offset = self.storage_offset() + start as usize * strides[axis];
        sizes[axis] = len as usize;
        // The stride of an axis with at most one element is never stepped over.
        if len > 1 {
            strides[axis] = strides[axis]
                .checked_mul(step as usize)
                .ok_or_else(|| TensorError::invalid("slice", "step overflows the axis stride"))?;
        }
        Ok(self.alias_with(sizes, strides, offset))
    }

    /// Reshapes to `shape` (one entry may be `-1`), as a view whenever the strides allow.
    pub fn reshape(&self, shape: &[i64]) -> TensorResult<Tensor> {
        let sizes = infer_size(shape, self.numel())?;
        match compute_stride(self.sizes(), self.strides(), &sizes) {
            Some(strides) => Ok(self.alias_with(sizes, strides, self.storage_offset())),
            None => {
                let mut dense = self.contiguous()?;
                dense.resize_(&sizes);
                Ok(dense)
            }
        }
    }

    /// Collapses axes `start_dim..=end_dim` into one.
    pub fn flatten(&self, start_dim: i64, end_dim: i64) -> TensorResult<Tensor> {
        if self.dim() == 0 {
            return self.reshape(&[1]);
        }
        let start = wrap_dim(start_dim, self.dim())?;
        let end = wrap_dim(end_dim, self.dim())?;
        if start > end {
            return Err(TensorError::invalid(
                "flatten",
                "start_dim cannot come after end_dim",
            ));
        }
        if start == end {
            return Ok(self.clone());
        }
        let collapsed: usize = self.sizes()[start..=end].iter().product();
        let mut shape: Vec<i64> = Vec::with_capacity(self.dim() - (end - start));
        shape.extend(self.sizes()[..start].iter().map(|s| *s as i64));
        shape.push(collapsed as i64);
        shape.extend(self.sizes()[end + 1..].iter().map(|s| *s as i64));
        self.reshape(&shape)
    }

    /// Returns `self` when already dense, otherwise a dense copy.
    pub fn contiguous(&self) -> TensorResult<Tensor> {
        if self.is_contiguous() {
            return Ok(self.clone());
        }
        let mut dense = Tensor::zeros(self.dtype(), self.sizes());
        dense.copy_elements_from(self)?;
        Ok(dense)
    }

    /// Converts to `dtype` and layout.
    ///
    /// Returns an alias of `self` when nothing has to change and `copy` is false. A copy under
    /// the preserving layout keeps the source strides when they are non-overlapping and dense,
    /// and is row-major otherwise.
    pub fn to(
        &self,
        dtype: DType,
        copy: bool,
        memory_format: Option<MemoryFormat>,
    ) -> TensorResult<Tensor> {
        let preserve = !matches!(memory_format, Some(MemoryFormat::Contiguous));
        let layout_matches = preserve || self.is_contiguous();
        if dtype == self.dtype() && layout_matches && !copy {
            return Ok(self.clone());
        }
        let mut converted = if preserve && self.is_non_overlapping_and_dense() {
            Tensor::zeros_strided(dtype, self.sizes(), self.strides())
        } else {
            Tensor::zeros(dtype, self.sizes())
        };
        converted.copy_elements_from(self)?;
        Ok(converted)
    }
}

/// Resolves a single `-1` entry against `numel`.
pub(crate) fn infer_size(shape: &[i64], numel: usize) -> TensorResult<Dims> {
    let mut inferred = None;
    let mut known = 1usize;
    let mut sizes = Dims::with_capacity(shape.len());
    for (axis, dim) in shape.iter().enumerate() {
        match *dim {
            -1 => {
                if inferred.replace(axis).is_some() {
                    return Err(TensorError::shape("only one dimension can be inferred"));
                }
                sizes.push(0);
            }
            d if d < 0 => {
                return Err(TensorError::shape(format!("invalid shape dimension {}", d)));
            }
            d => {
                known *= d as usize;
                sizes.push(d as usize);
            }
        }
    }
    match inferred {
        Some(axis) => {
            if known == 0 || numel % known != 0 {
                return Err(TensorError::shape(format!(
                    "shape {:?} is invalid for input of size {}",
                    shape, numel
                )));
            }
            sizes[axis] = numel / known;
        }
        None if known != numel => {
            return Err(TensorError::shape(format!(
                "shape {:?} is invalid for input of size {}",
                shape, numel
            )));
        }
        None => {}
    }
    Ok(sizes)
}

/// Strides that let `new_sizes` view the memory described by `old_sizes`/`old_strides`,
/// or `None` when the reshape needs a copy.
pub(crate) fn compute_stride(
    old_sizes: &[usize],
    old_strides: &[usize],
    new_sizes: &[usize],
) -> Option<Dims> {
    if old_sizes.is_empty() {
        return Some(smallvec![1; new_sizes.len()]);
    }
    let numel: usize = old_sizes.iter().product();
    if numel == 0 {
        if old_sizes == new_sizes {
            return Some(Dims::from_slice(old_strides));
        }
        return Some(contiguous_strides(new_sizes));
    }

    let mut new_strides: Dims = smallvec![0; new_sizes.len()];
    let mut view_d = new_sizes.len() as isize - 1;
    let mut chunk_base_stride = *old_strides.last()?;
    let mut tensor_numel = 1usize;
    let mut view_numel = 1usize;
    for tensor_d in (0..old_sizes.len()).rev() {
        tensor_numel *= old_sizes[tensor_d];
        let chunk_ends = tensor_d == 0
            || (old_sizes[tensor_d - 1] != 1
                && old_strides[tensor_d - 1] != tensor_numel * chunk_base_stride);
        if chunk_ends {
            while view_d >= 0
                && (view_numel < tensor_numel || new_sizes[view_d as usize] == 1)
            {
                new_strides[view_d as usize] = view_numel * chunk_base_stride;
                view_numel *= new_sizes[view_d as usize];
                view_d -= 1;
            }
            if view_numel != tensor_numel {
                return None;
            }
            if tensor_d > 0 {
                chunk_base_stride = old_strides[tensor_d - 1];
                tensor_numel = 1;
                view_numel = 1;
            }
        }
    }
    if view_d != -1 {
        return None;
    }
    Some(new_strides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_dim_handles_negative_axes() {
        assert_eq!(wrap_dim(-1, 3).unwrap(), 2);
        assert_eq!(wrap_dim(0, 0).unwrap(), 0);
        assert!(wrap_dim(3, 3).is_err());
        assert!(wrap_dim(-4, 3).is_err());
    }

    #[test]
    fn compute_stride_views_contiguous_memory() {
        let strides = compute_stride(&[2, 3, 4], &[12, 4, 1], &[6, 4]).unwrap();
        assert_eq!(strides.as_slice(), &[4, 1]);
    }

    #[test]
    fn compute_stride_rejects_transposed_merge() {
        // [3, 2] transposed from a dense [2, 3].
        assert!(compute_stride(&[3, 2], &[1, 3], &[6]).is_none());
        let split = compute_stride(&[3, 2], &[1, 3], &[3, 1, 2]).unwrap();
        assert_eq!(split.as_slice(), &[1, 6, 3]);
    }

    #[test]
    fn infer_size_fills_wildcard() {
        assert_eq!(infer_size(&[-1, 4], 12).unwrap().as_slice(), &[3, 4]);
        assert!(infer_size(&[-1, -1], 12).is_err());
        assert!(infer_size(&[5], 12).is_err());
    }
}
