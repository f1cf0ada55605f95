mod descriptor;
mod device;
mod dtype;
mod shape;

pub use descriptor::{TensorDescriptor, TensorDescriptorMut};
pub use device::{Device, DeviceKind};
pub use dtype::{DataType, DataTypeCode};
pub use shape::{checked_numel, compute_strides, is_compact, numel, TensorShape};
pub(crate) use shape::strided_offset;
