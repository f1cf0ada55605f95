//! Non-owning tensor views.
//!
//! A descriptor pairs a borrowed byte buffer with its placement, element
//! type and shape. Building one never allocates or copies; the borrow
//! checker ties the descriptor to the buffer it describes.

use bytemuck::Pod;

use super::shape::{is_compact, numel};
use super::{DataType, Device, TensorShape};

#[derive(Debug, Clone, Copy)]
pub struct TensorDescriptor<'a> {
    data: &'a [u8],
    device: Device,
    dtype: DataType,
    shape: &'a [i64],
    strides: Option<&'a [i64]>,
}

impl<'a> TensorDescriptor<'a> {
    /// Describe a dense row-major tensor stored in `data`.
    ///
    /// `data` must hold exactly `product(shape) * dtype.bytes()` bytes. This
    /// is only checked in debug builds.
    pub fn make_view(data: &'a [u8], device: Device, dtype: DataType, shape: &'a [i64]) -> Self {
        debug_assert_eq!(
            data.len(),
            numel(shape).saturating_mul(dtype.bytes()),
            "tensor view byte length does not match {}{:?}",
            dtype,
            shape
        );
        Self {
            data,
            device,
            dtype,
            shape,
            strides: None,
        }
    }

    /// Describe a strided tensor. Strides are in elements.
    pub fn with_strides(
        data: &'a [u8],
        device: Device,
        dtype: DataType,
        shape: &'a [i64],
        strides: &'a [i64],
    ) -> Self {
        debug_assert_eq!(shape.len(), strides.len(), "strides rank does not match shape");
        Self {
            data,
            device,
            dtype,
            shape,
            strides: Some(strides),
        }
    }

    pub fn from_slice<T: Pod>(data: &'a [T], dtype: DataType, shape: &'a [i64]) -> Self {
        Self::make_view(bytemuck::cast_slice(data), Device::default(), dtype, shape)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// View typed elements in place. Returns `None` for strided views and
    /// for buffers whose length or alignment does not fit `T`.
    pub fn as_slice<T: Pod>(&self) -> Option<&'a [T]> {
        if !self.is_compact() {
            return None;
        }
        bytemuck::try_cast_slice(self.data).ok()
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn shape(&self) -> &'a [i64] {
        self.shape
    }

    pub fn strides(&self) -> Option<&'a [i64]> {
        self.strides
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        numel(self.shape)
    }

    pub fn byte_size(&self) -> usize {
        self.numel().saturating_mul(self.dtype.bytes())
    }

    pub fn is_compact(&self) -> bool {
        is_compact(self.shape, self.strides)
    }

    pub fn tensor_shape(&self) -> TensorShape {
        TensorShape::new(self.dtype, self.shape)
    }
}

/// Writable counterpart of [`TensorDescriptor`], always dense row-major.
#[derive(Debug)]
pub struct TensorDescriptorMut<'a> {
    data: &'a mut [u8],
    device: Device,
    dtype: DataType,
    shape: &'a [i64],
}

impl<'a> TensorDescriptorMut<'a> {
    pub fn make_view(
        data: &'a mut [u8],
        device: Device,
        dtype: DataType,
        shape: &'a [i64],
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            numel(shape).saturating_mul(dtype.bytes()),
            "tensor view byte length does not match {}{:?}",
            dtype,
            shape
        );
        Self {
            data,
            device,
            dtype,
            shape,
        }
    }

    pub fn from_slice<T: Pod>(data: &'a mut [T], dtype: DataType, shape: &'a [i64]) -> Self {
        Self::make_view(bytemuck::cast_slice_mut(data), Device::default(), dtype, shape)
    }

    pub fn data(&self) -> &[u8] {
        &*self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    pub fn as_slice<T: Pod>(&self) -> Option<&[T]> {
        bytemuck::try_cast_slice(&*self.data).ok()
    }

    pub fn as_mut_slice<T: Pod>(&mut self) -> Option<&mut [T]> {
        bytemuck::try_cast_slice_mut(&mut *self.data).ok()
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn shape(&self) -> &'a [i64] {
        self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        numel(self.shape)
    }

    pub fn byte_size(&self) -> usize {
        self.numel().saturating_mul(self.dtype.bytes())
    }

    pub fn tensor_shape(&self) -> TensorShape {
        TensorShape::new(self.dtype, self.shape)
    }

    /// Shorter-lived mutable view of the same buffer.
    pub fn reborrow(&mut self) -> TensorDescriptorMut<'_> {
        TensorDescriptorMut {
            data: &mut *self.data,
            device: self.device,
            dtype: self.dtype,
            shape: self.shape,
        }
    }

    /// Read-only view of the same buffer.
    pub fn as_view(&self) -> TensorDescriptor<'_> {
        TensorDescriptor {
            data: &*self.data,
            device: self.device,
            dtype: self.dtype,
            shape: self.shape,
            strides: None,
        }
    }
}
