//! Embedded inference runtime for ahead-of-time compiled models.
//!
//! A model compiler emits kernels with one uniform calling convention, a
//! table naming them, and a static graph description. This crate registers
//! the kernels, loads the description into a [`GraphExecutor`] backed by a
//! single preallocated arena, and runs it.

pub mod error;
pub mod graph;
pub mod logging;
pub mod packed;
pub mod registry;
pub mod runtime;
pub mod tensor;

pub use error::{Error, Result};
pub use graph::{Binding, BufferDecl, GraphDescription, GraphDeserialize, GraphSerialize, OpDecl};
pub use packed::{
    call_packed, packed_fn, slice_kernel, Element, KernelFn, PackedArgs, PackedFunc, PackedValue, Status,
    TypeCode,
};
pub use registry::{FuncHandle, FunctionRegistry, Module, Runtime};
pub use runtime::{ExecutorConfig, ExecutorState, GraphExecutor, TraceEvent};
pub use tensor::{
    DataType, DataTypeCode, Device, DeviceKind, TensorDescriptor, TensorDescriptorMut, TensorShape,
};
