use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::DataType;

/// Number of elements described by `shape`. Negative dims count as zero;
/// a product past `usize::MAX` saturates.
pub fn numel(shape: &[i64]) -> usize {
    checked_numel(shape).unwrap_or(usize::MAX)
}

/// Like [`numel`], but `None` when the element count overflows `usize`.
pub fn checked_numel(shape: &[i64]) -> Option<usize> {
    shape
        .iter()
        .map(|dim| usize::try_from(*dim).unwrap_or(0))
        .try_fold(1usize, |acc, dim| acc.checked_mul(dim))
}

/// Dense row-major strides, in elements.
pub fn compute_strides(shape: &[i64]) -> SmallVec<[i64; 6]> {
    let mut strides: SmallVec<[i64; 6]> = SmallVec::from_elem(0, shape.len());
    let mut stride = 1i64;
    for (idx, dim) in shape.iter().rev().enumerate() {
        let i = shape.len() - 1 - idx;
        strides[i] = stride;
        stride = stride.saturating_mul(*dim);
    }
    strides
}

/// True when `strides` (if any) describe the dense row-major layout of `shape`.
pub fn is_compact(shape: &[i64], strides: Option<&[i64]>) -> bool {
    let Some(strides) = strides else {
        return true;
    };
    if shape.len() != strides.len() {
        return false;
    }
    // Strides on unit dims never affect addressing.
    let dense = compute_strides(shape);
    shape
        .iter()
        .zip(strides.iter().zip(dense.iter()))
        .all(|(dim, (stride, expected))| *dim == 1 || stride == expected)
}

/// Element offset of the `linear`-th element (row-major order) of a strided
/// view. `None` when the offset is negative or overflows.
pub(crate) fn strided_offset(linear: usize, shape: &[i64], strides: &[i64]) -> Option<usize> {
    let mut rem = linear;
    let mut offset = 0i64;
    for (dim, stride) in shape.iter().zip(strides.iter()).rev() {
        let dim = usize::try_from(*dim).unwrap_or(0).max(1);
        let coord = i64::try_from(rem % dim).ok()?;
        rem /= dim;
        offset = offset.checked_add(coord.checked_mul(*stride)?)?;
    }
    usize::try_from(offset).ok()
}

/// Owned dtype and shape pair, used for buffer declarations and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorShape {
    pub dtype: DataType,
    pub shape: Vec<i64>,
}

impl TensorShape {
    pub fn new(dtype: DataType, shape: impl Into<Vec<i64>>) -> Self {
        Self {
            dtype,
            shape: shape.into(),
        }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        numel(&self.shape)
    }

    pub fn byte_size(&self) -> usize {
        self.checked_byte_size().unwrap_or(usize::MAX)
    }

    pub fn checked_byte_size(&self) -> Option<usize> {
        checked_numel(&self.shape)?.checked_mul(self.dtype.bytes())
    }

    pub fn matches(&self, dtype: DataType, shape: &[i64]) -> bool {
        self.dtype == dtype && self.shape == shape
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.dtype, self.shape)
    }
}
