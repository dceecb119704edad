//! Element types and memory layout tags.

/// Logical element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating point following IEEE-754 semantics.
    F32,
    /// 64-bit floating point.
    F64,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer, used for indices and integer scalars.
    I64,
    /// One byte per element, zero is false.
    Bool,
}

impl DType {
    /// Returns the number of bytes required per scalar element.
    pub fn size_in_bytes(self) -> usize {
        match self {
            DType::F32 | DType::I32 => 4,
            DType::F64 | DType::I64 => 8,
            DType::Bool => 1,
        }
    }

    pub fn is_floating_point(self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }

    /// Reads element `index` of a dense byte buffer, widened to `f64`.
    pub(crate) fn read(self, bytes: &[u8], index: usize) -> f64 {
        match self {
            DType::F32 => f32::from_le_bytes(chunk(bytes, index)) as f64,
            DType::F64 => f64::from_le_bytes(chunk(bytes, index)),
            DType::I32 => i32::from_le_bytes(chunk(bytes, index)) as f64,
            DType::I64 => i64::from_le_bytes(chunk(bytes, index)) as f64,
            DType::Bool => {
                if bytes[index] != 0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Reads element `index` as an integer without the `f64` round trip for 64-bit ints.
    pub(crate) fn read_i64(self, bytes: &[u8], index: usize) -> i64 {
        match self {
            DType::I64 => i64::from_le_bytes(chunk(bytes, index)),
            DType::I32 => i32::from_le_bytes(chunk(bytes, index)) as i64,
            other => other.read(bytes, index) as i64,
        }
    }

    /// Narrows `value` to this dtype and stores it at element `index`.
    pub(crate) fn write(self, bytes: &mut [u8], index: usize, value: f64) {
        match self {
            DType::F32 => put(bytes, index, (value as f32).to_le_bytes()),
            DType::F64 => put(bytes, index, value.to_le_bytes()),
            DType::I32 => put(bytes, index, (value as i32).to_le_bytes()),
            DType::I64 => put(bytes, index, (value as i64).to_le_bytes()),
            DType::Bool => bytes[index] = u8::from(value != 0.0),
        }
    }
}

fn chunk<const N: usize>(bytes: &[u8], index: usize) -> [u8; N] {
    let start = index * N;
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[start..start + N]);
    out
}

fn put<const N: usize>(bytes: &mut [u8], index: usize, value: [u8; N]) {
    let start = index * N;
    bytes[start..start + N].copy_from_slice(&value);
}

/// Requested memory layout for conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryFormat {
    /// Dense row-major strides.
    Contiguous,
    /// Keep whatever layout the source already has.
    Preserve,
}
