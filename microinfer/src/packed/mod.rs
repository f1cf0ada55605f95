//! The packed-call convention shared by kernels and runtime functions.

mod args;
mod func;
mod value;

pub use args::{PackedArgs, PackedInputs, INLINE_ARGS};
pub use func::{
    call_packed, packed_fn, slice_kernel, Element, FnKernel, KernelFn, PackedFunc, SliceKernel,
    SliceKernelAdapter, Status,
};
pub use value::{PackedValue, TypeCode};
