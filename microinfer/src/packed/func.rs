use std::fmt;

use bytemuck::Pod;
use thiserror::Error;

use super::{PackedArgs, PackedInputs, PackedValue, TypeCode};
use crate::tensor::{DataType, TensorDescriptorMut};

/// Failure status of a packed call. Success is the `Ok` side of the result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Status {
    #[error("argument {index}: expected {expected}, got {actual}")]
    TypeMismatch {
        index: usize,
        expected: TypeCode,
        actual: TypeCode,
    },
    #[error("expected {expected} arguments, got {actual}")]
    ArgCount { expected: usize, actual: usize },
    #[error("argument {index} is a read-only tensor")]
    ReadOnly { index: usize },
    #[error("argument {index}: expected {expected} elements, got {actual}")]
    DTypeMismatch {
        index: usize,
        expected: DataType,
        actual: DataType,
    },
    #[error("argument {index} is not a dense, aligned tensor")]
    Layout { index: usize },
    #[error("status code {0}")]
    Code(i32),
}

impl Status {
    /// Numeric status as seen across a C boundary. Always negative.
    pub fn code(&self) -> i32 {
        match self {
            Status::TypeMismatch { .. } => -2,
            Status::ArgCount { .. } => -3,
            Status::ReadOnly { .. } => -4,
            Status::DTypeMismatch { .. } => -5,
            Status::Layout { .. } => -6,
            Status::Code(code) => -code.saturating_abs().max(1),
        }
    }
}

/// A callable honoring the packed-call convention.
///
/// Kernels receive their input tensors followed by the output tensor and
/// write the output in place, returning `PackedValue::Null`. Runtime
/// functions may return handles borrowed from `self`.
pub trait PackedFunc: Send + Sync {
    fn call(&self, args: &mut PackedArgs<'_>) -> Result<PackedValue<'_>, Status>;
}

/// Entry point shape emitted by the kernel generator.
pub type KernelFn = for<'a, 'b> fn(&'a mut PackedArgs<'b>) -> Result<PackedValue<'static>, Status>;

impl PackedFunc for KernelFn {
    fn call(&self, args: &mut PackedArgs<'_>) -> Result<PackedValue<'_>, Status> {
        (self)(args)
    }
}

pub struct FnKernel<F>(F);

impl<F> PackedFunc for FnKernel<F>
where
    F: Fn(&mut PackedArgs<'_>) -> Result<PackedValue<'static>, Status> + Send + Sync,
{
    fn call(&self, args: &mut PackedArgs<'_>) -> Result<PackedValue<'_>, Status> {
        (self.0)(args)
    }
}

impl<F> fmt::Debug for FnKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnKernel")
    }
}

/// Pack `values` in order and call `func` once.
pub fn call_packed<'f, 'a, I>(func: &'f dyn PackedFunc, values: I) -> Result<PackedValue<'f>, Status>
where
    I: IntoIterator<Item = PackedValue<'a>>,
{
    let mut args: PackedArgs<'a> = values.into_iter().collect();
    func.call(&mut args)
}

/// Wrap a closure as a packed function.
pub fn packed_fn<F>(func: F) -> FnKernel<F>
where
    F: Fn(&mut PackedArgs<'_>) -> Result<PackedValue<'static>, Status> + Send + Sync,
{
    FnKernel(func)
}

/// Element types a typed slice kernel can be written against.
pub trait Element: Pod {
    const DTYPE: DataType;
}

macro_rules! impl_element {
    ($($t:ty => $dtype:ident),+ $(,)?) => {
        $(impl Element for $t {
            const DTYPE: DataType = DataType::$dtype;
        })+
    };
}

impl_element!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    f32 => F32,
    f64 => F64,
);

/// Adapts a slice-level kernel to the packed-call convention.
pub trait SliceKernelAdapter {
    fn call(&self, args: &mut PackedArgs<'_>) -> Result<(), Status>;
}

/// Packed function built from a [`SliceKernelAdapter`].
pub struct SliceKernel<K>(K);

impl<K> PackedFunc for SliceKernel<K>
where
    K: SliceKernelAdapter + Send + Sync,
{
    fn call(&self, args: &mut PackedArgs<'_>) -> Result<PackedValue<'_>, Status> {
        self.0.call(args)?;
        Ok(PackedValue::Null)
    }
}

/// Wrap a typed slice kernel, e.g.
/// `slice_kernel(relu as fn(&[i8], &mut [i8]) -> Result<(), Status>)`.
pub fn slice_kernel<K>(func: K) -> SliceKernel<K>
where
    K: SliceKernelAdapter + Send + Sync,
{
    SliceKernel(func)
}

fn typed_input<'s, T: Element>(inputs: &PackedInputs<'s, '_>, index: usize) -> Result<&'s [T], Status> {
    let tensor = inputs.tensor(index)?;
    if tensor.dtype() != T::DTYPE {
        return Err(Status::DTypeMismatch {
            index,
            expected: T::DTYPE,
            actual: tensor.dtype(),
        });
    }
    tensor.as_slice::<T>().ok_or(Status::Layout { index })
}

fn typed_output<'o, T: Element>(
    output: &'o mut TensorDescriptorMut<'_>,
    index: usize,
) -> Result<&'o mut [T], Status> {
    if output.dtype() != T::DTYPE {
        return Err(Status::DTypeMismatch {
            index,
            expected: T::DTYPE,
            actual: output.dtype(),
        });
    }
    output.as_mut_slice::<T>().ok_or(Status::Layout { index })
}

macro_rules! impl_slice_kernel_adapter {
    ($count:literal, $(($var:ident, $T:ident, $lt:tt, $idx:tt)),+; $($all_lt:tt),+) => {
        impl<$($T,)+ R> SliceKernelAdapter
            for for<$($all_lt,)+ 'r> fn($( &$lt [$T], )+ &'r mut [R]) -> Result<(), Status>
        where
            $($T: Element,)+
            R: Element,
        {
            fn call(&self, args: &mut PackedArgs<'_>) -> Result<(), Status> {
                args.expect_len($count + 1)?;
                let (inputs, mut output) = args.split_output()?;
                $(
                    let $var = typed_input::<$T>(&inputs, $idx)?;
                )+
                let out = typed_output::<R>(&mut output, $count)?;
                (self)($( $var, )+ out)
            }
        }
    };
}

impl_slice_kernel_adapter!(1, (a, A, 'a, 0); 'a);
impl_slice_kernel_adapter!(2, (a, A, 'a, 0), (b, B, 'b, 1); 'a, 'b);
impl_slice_kernel_adapter!(3, (a, A, 'a, 0), (b, B, 'b, 1), (c, C, 'c, 2); 'a, 'b, 'c);
