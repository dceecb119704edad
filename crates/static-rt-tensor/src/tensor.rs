//! Strided tensor over shared [`Storage`].

use std::fmt;
use std::sync::Arc;

use smallvec::{smallvec, SmallVec};

use crate::dtype::DType;
use crate::error::{TensorError, TensorResult};
use crate::storage::Storage;

/// Inline dimension vector; most tensors in practice have rank four or less.
pub type Dims = SmallVec<[usize; 4]>;

/// Host tensor: dtype, sizes, strides (in elements) and an element offset into storage.
///
/// Cloning a tensor is cheap and yields an alias of the same storage.
#[derive(Clone)]
pub struct Tensor {
    storage: Arc<Storage>,
    dtype: DType,
    sizes: Dims,
    strides: Dims,
    offset: usize,
}

impl Tensor {
    /// One-dimensional, zero-element tensor with an empty storage of the given dtype.
    pub fn empty(dtype: DType) -> Self {
        Tensor {
            storage: Arc::new(Storage::default()),
            dtype,
            sizes: smallvec![0],
            strides: smallvec![1],
            offset: 0,
        }
    }

    /// Zero-filled dense tensor.
    pub fn zeros(dtype: DType, sizes: &[usize]) -> Self {
        let numel: usize = sizes.iter().product();
        Tensor {
            storage: Arc::new(Storage::new(vec![0u8; numel * dtype.size_in_bytes()])),
            dtype,
            sizes: Dims::from_slice(sizes),
            strides: contiguous_strides(sizes),
            offset: 0,
        }
    }

    /// Builds a dense tensor from `f64` values, narrowing them to `dtype`.
    pub fn from_f64(dtype: DType, sizes: &[usize], values: &[f64]) -> TensorResult<Self> {
        let mut tensor = Tensor::zeros(dtype, sizes);
        tensor.copy_from_f64(values)?;
        Ok(tensor)
    }

    pub fn from_f32(sizes: &[usize], values: Vec<f32>) -> TensorResult<Self> {
        let widened: Vec<f64> = values.into_iter().map(f64::from).collect();
        Tensor::from_f64(DType::F32, sizes, &widened)
    }

    pub fn from_i64(sizes: &[usize], values: Vec<i64>) -> TensorResult<Self> {
        let numel: usize = sizes.iter().product();
        if values.len() != numel {
            return Err(TensorError::DataLength {
                len: values.len(),
                sizes: sizes.to_vec(),
            });
        }
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Ok(Tensor {
            storage: Arc::new(Storage::new(bytes)),
            dtype: DType::I64,
            sizes: Dims::from_slice(sizes),
            strides: contiguous_strides(sizes),
            offset: 0,
        })
    }

    /// Zero-dimensional `I64` tensor holding `value`.
    pub fn scalar_i64(value: i64) -> Self {
        let bytes = value.to_le_bytes().to_vec();
        Tensor {
            storage: Arc::new(Storage::new(bytes)),
            dtype: DType::I64,
            sizes: Dims::new(),
            strides: Dims::new(),
            offset: 0,
        }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn storage_offset(&self) -> usize {
        self.offset
    }

    /// Rank of the tensor.
    pub fn dim(&self) -> usize {
        self.sizes.len()
    }

    pub fn numel(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Size along `dim`, accepting negative indices.
    pub fn size(&self, dim: i64) -> TensorResult<usize> {
        let axis = crate::view::wrap_dim(dim, self.dim())?;
        Ok(self.sizes.get(axis).copied().unwrap_or(1))
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    /// Identity of the underlying storage object; equal ids mean the tensors alias.
    pub fn storage_id(&self) -> usize {
        Arc::as_ptr(&self.storage) as usize
    }

    /// Address of the first element of this tensor inside the current allocation.
    pub fn data_ptr(&self) -> usize {
        self.storage.data_ptr() + self.offset * self.dtype.size_in_bytes()
    }

    pub fn shares_storage(&self, other: &Tensor) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Whether the strides describe a dense row-major layout.
    pub fn is_contiguous(&self) -> bool {
        if self.numel() == 0 {
            return true;
        }
        let mut expected = 1usize;
        for (size, stride) in self.sizes.iter().zip(self.strides.iter()).rev() {
            if *size == 1 {
                continue;
            }
            if *stride != expected {
                return false;
            }
            expected *= size;
        }
        true
    }

    /// Visits the storage element index of every logical element in row-major order.
    pub(crate) fn for_each_index(&self, mut visit: impl FnMut(usize)) {
        let numel = self.numel();
        if numel == 0 {
            return;
        }
        let rank = self.sizes.len();
        let mut counter: Dims = smallvec![0; rank];
        let mut index = self.offset;
        for _ in 0..numel {
            visit(index);
            for axis in (0..rank).rev() {
                counter[axis] += 1;
                index += self.strides[axis];
                if counter[axis] < self.sizes[axis] {
                    break;
                }
                index -= self.strides[axis] * self.sizes[axis];
                counter[axis] = 0;
            }
        }
    }

    /// Gathers all elements in logical order, widened to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        let bytes = self.storage.read();
        let mut out = Vec::with_capacity(self.numel());
        self.for_each_index(|index| out.push(self.dtype.read(&bytes, index)));
        out
    }

    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.to_f64_vec().into_iter().map(|v| v as f32).collect()
    }

    pub fn to_i64_vec(&self) -> Vec<i64> {
        let bytes = self.storage.read();
        let mut out = Vec::with_capacity(self.numel());
        self.for_each_index(|index| out.push(self.dtype.read_i64(&bytes, index)));
        out
    }

    /// Value of a single-element tensor.
    pub fn item_f64(&self) -> TensorResult<f64> {
        self.ensure_single_element()?;
        Ok(self.to_f64_vec()[0])
    }

    pub fn item_i64(&self) -> TensorResult<i64> {
        self.ensure_single_element()?;
        Ok(self.to_i64_vec()[0])
    }

    fn ensure_single_element(&self) -> TensorResult<()> {
        if self.numel() != 1 {
            return Err(TensorError::invalid(
                "item",
                format!(
                    "a tensor with {} elements cannot be converted to a scalar",
                    self.numel()
                ),
            ));
        }
        Ok(())
    }

    /// Writes `values` into this tensor's elements in logical order.
    pub fn copy_from_f64(&mut self, values: &[f64]) -> TensorResult<()> {
        if values.len() != self.numel() {
            return Err(TensorError::DataLength {
                len: values.len(),
                sizes: self.sizes.to_vec(),
            });
        }
        let dtype = self.dtype;
        let mut bytes = self.storage.write();
        let mut source = values.iter();
        self.for_each_index(|index| {
            if let Some(value) = source.next() {
                dtype.write(&mut bytes, index, *value);
            }
        });
        Ok(())
    }

    /// Gathers the raw bytes of every element in logical order.
    pub(crate) fn to_element_bytes(&self) -> Vec<u8> {
        let width = self.dtype.size_in_bytes();
        let bytes = self.storage.read();
        let mut out = Vec::with_capacity(self.numel() * width);
        self.for_each_index(|index| {
            let start = index * width;
            out.extend_from_slice(&bytes[start..start + width]);
        });
        out
    }

    /// Writes raw element bytes of this tensor's dtype in logical order.
    pub(crate) fn copy_from_element_bytes(&mut self, values: &[u8]) -> TensorResult<()> {
        let width = self.dtype.size_in_bytes();
        if values.len() != self.numel() * width {
            return Err(TensorError::DataLength {
                len: values.len() / width,
                sizes: self.sizes.to_vec(),
            });
        }
        let mut bytes = self.storage.write();
        let mut source = values.chunks_exact(width);
        self.for_each_index(|index| {
            if let Some(element) = source.next() {
                let start = index * width;
                bytes[start..start + width].copy_from_slice(element);
            }
        });
        Ok(())
    }

    /// Copies the elements of `src` in logical order. Equal dtypes move bytes unchanged;
    /// different dtypes convert through `f64`.
    pub(crate) fn copy_elements_from(&mut self, src: &Tensor) -> TensorResult<()> {
        if self.dtype == src.dtype {
            self.copy_from_element_bytes(&src.to_element_bytes())
        } else {
            self.copy_from_f64(&src.to_f64_vec())
        }
    }

    /// Whether the elements tile one gap-free block under some ordering of the axes.
    pub fn is_non_overlapping_and_dense(&self) -> bool {
        if self.is_contiguous() {
            return true;
        }
        let mut axes: Dims = (0..self.dim()).filter(|axis| self.sizes[*axis] != 1).collect();
        axes.sort_by_key(|axis| self.strides[*axis]);
        let mut expected = 1usize;
        for axis in axes {
            if self.strides[axis] != expected {
                return false;
            }
            expected *= self.sizes[axis];
        }
        true
    }

    /// Zero-filled tensor laid out with `strides`, which must be non-overlapping and dense.
    pub(crate) fn zeros_strided(dtype: DType, sizes: &[usize], strides: &[usize]) -> Self {
        let numel: usize = sizes.iter().product();
        Tensor {
            storage: Arc::new(Storage::new(vec![0u8; numel * dtype.size_in_bytes()])),
            dtype,
            sizes: Dims::from_slice(sizes),
            strides: Dims::from_slice(strides),
            offset: 0,
        }
    }

    /// Reshapes in place to dense `sizes`, growing storage only when it is too small.
    ///
    /// The storage object is never replaced, so aliases observe the new contents.
    pub fn resize_(&mut self, sizes: &[usize]) {
        let numel: usize = sizes.iter().product();
        self.storage
            .ensure_nbytes((self.offset + numel) * self.dtype.size_in_bytes());
        self.sizes = Dims::from_slice(sizes);
        self.strides = contiguous_strides(sizes);
    }

    /// Restrides in place; storage grows if the strided extent exceeds it.
    pub fn as_strided_(&mut self, sizes: &[usize], strides: &[usize]) -> TensorResult<()> {
        if sizes.len() != strides.len() {
            return Err(TensorError::shape(format!(
                "mismatch in length of strides and shape: {} vs {}",
                strides.len(),
                sizes.len()
            )));
        }
        let extent = if sizes.iter().any(|s| *s == 0) {
            0
        } else {
            1 + sizes
                .iter()
                .zip(strides)
                .map(|(size, stride)| (size - 1) * stride)
                .sum::<usize>()
        };
        self.storage
            .ensure_nbytes((self.offset + extent) * self.dtype.size_in_bytes());
        self.sizes = Dims::from_slice(sizes);
        self.strides = Dims::from_slice(strides);
        Ok(())
    }

    /// New tensor sharing this tensor's storage with different metadata.
    pub(crate) fn alias_with(&self, sizes: Dims, strides: Dims, offset: usize) -> Tensor {
        Tensor {
            storage: Arc::clone(&self.storage),
            dtype: self.dtype,
            sizes,
            strides,
            offset,
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("dtype", &self.dtype)
            .field("sizes", &self.sizes.as_slice())
            .field("strides", &self.strides.as_slice())
            .field("offset", &self.offset)
            .finish()
    }
}

/// Row-major strides for `sizes`; zero-sized axes are treated as size one.
pub fn contiguous_strides(sizes: &[usize]) -> Dims {
    let mut strides: Dims = smallvec![1; sizes.len()];
    for axis in (0..sizes.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * sizes[axis + 1].max(1);
    }
    strides
}
