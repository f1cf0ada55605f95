use std::any::Any;

use smallvec::SmallVec;

use super::{PackedValue, Status, TypeCode};
use crate::registry::Module;
use crate::tensor::{TensorDescriptor, TensorDescriptorMut};

/// Arguments kept inline before spilling to the heap.
pub const INLINE_ARGS: usize = 8;

/// Positional arguments of a packed call.
///
/// Every value carries its own type tag; callees read payloads only through
/// the tag-checked accessors below.
#[derive(Debug, Default)]
pub struct PackedArgs<'a> {
    values: SmallVec<[PackedValue<'a>; INLINE_ARGS]>,
}

impl<'a> PackedArgs<'a> {
    pub fn new() -> Self {
        Self {
            values: SmallVec::new(),
        }
    }

    pub fn push(&mut self, value: impl Into<PackedValue<'a>>) {
        self.values.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PackedValue<'a>> {
        self.values.get(index)
    }

    pub fn type_code(&self, index: usize) -> Option<TypeCode> {
        self.values.get(index).map(PackedValue::type_code)
    }

    pub fn type_codes(&self) -> impl Iterator<Item = TypeCode> + '_ {
        self.values.iter().map(PackedValue::type_code)
    }

    pub fn expect_len(&self, expected: usize) -> Result<(), Status> {
        if self.values.len() != expected {
            return Err(Status::ArgCount {
                expected,
                actual: self.values.len(),
            });
        }
        Ok(())
    }

    pub fn int(&self, index: usize) -> Result<i64, Status> {
        match self.arg(index)? {
            PackedValue::Int(v) => Ok(*v),
            other => Err(mismatch(index, TypeCode::Int, other)),
        }
    }

    pub fn float(&self, index: usize) -> Result<f64, Status> {
        match self.arg(index)? {
            PackedValue::Float(v) => Ok(*v),
            other => Err(mismatch(index, TypeCode::Float, other)),
        }
    }

    pub fn str(&self, index: usize) -> Result<&'a str, Status> {
        match self.arg(index)? {
            PackedValue::Str(v) => Ok(*v),
            other => Err(mismatch(index, TypeCode::Str, other)),
        }
    }

    pub fn module(&self, index: usize) -> Result<&'a Module, Status> {
        match self.arg(index)? {
            PackedValue::Module(m) => Ok(*m),
            other => Err(mismatch(index, TypeCode::ModuleHandle, other)),
        }
    }

    pub fn opaque(&self, index: usize) -> Result<&'a (dyn Any + Send + Sync), Status> {
        match self.arg(index)? {
            PackedValue::Opaque(h) => Ok(*h),
            other => Err(mismatch(index, TypeCode::OpaqueHandle, other)),
        }
    }

    pub fn tensor(&self, index: usize) -> Result<TensorDescriptor<'_>, Status> {
        tensor_at(&self.values, index)
    }

    pub fn tensor_mut(&mut self, index: usize) -> Result<TensorDescriptorMut<'_>, Status> {
        let len = self.values.len();
        match self.values.get_mut(index) {
            Some(PackedValue::TensorMut(t)) => Ok(t.reborrow()),
            Some(PackedValue::Tensor(_)) => Err(Status::ReadOnly { index }),
            Some(other) => Err(mismatch(index, TypeCode::TensorHandle, other)),
            None => Err(Status::ArgCount {
                expected: index + 1,
                actual: len,
            }),
        }
    }

    /// Split the kernel convention `(inputs.., output)` into read-only
    /// inputs and the writable trailing output tensor.
    pub fn split_output(&mut self) -> Result<(PackedInputs<'_, 'a>, TensorDescriptorMut<'_>), Status> {
        let index = self.values.len().checked_sub(1).ok_or(Status::ArgCount {
            expected: 1,
            actual: 0,
        })?;
        let (last, inputs) = self
            .values
            .split_last_mut()
            .ok_or(Status::ArgCount {
                expected: 1,
                actual: 0,
            })?;
        let output = match last {
            PackedValue::TensorMut(t) => t.reborrow(),
            PackedValue::Tensor(_) => return Err(Status::ReadOnly { index }),
            other => return Err(mismatch(index, TypeCode::TensorHandle, other)),
        };
        Ok((PackedInputs { values: inputs }, output))
    }

    fn arg(&self, index: usize) -> Result<&PackedValue<'a>, Status> {
        self.values.get(index).ok_or(Status::ArgCount {
            expected: index + 1,
            actual: self.values.len(),
        })
    }
}

impl<'a> FromIterator<PackedValue<'a>> for PackedArgs<'a> {
    fn from_iter<I: IntoIterator<Item = PackedValue<'a>>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Read-only input arguments produced by [`PackedArgs::split_output`].
#[derive(Debug, Clone, Copy)]
pub struct PackedInputs<'s, 'a> {
    values: &'s [PackedValue<'a>],
}

impl<'s, 'a> PackedInputs<'s, 'a> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn tensor(&self, index: usize) -> Result<TensorDescriptor<'s>, Status> {
        tensor_at(self.values, index)
    }

    pub fn int(&self, index: usize) -> Result<i64, Status> {
        match self.values.get(index) {
            Some(PackedValue::Int(v)) => Ok(*v),
            Some(other) => Err(mismatch(index, TypeCode::Int, other)),
            None => Err(Status::ArgCount {
                expected: index + 1,
                actual: self.values.len(),
            }),
        }
    }
}

fn tensor_at<'s>(values: &'s [PackedValue<'_>], index: usize) -> Result<TensorDescriptor<'s>, Status> {
    match values.get(index) {
        Some(PackedValue::Tensor(t)) => Ok(*t),
        Some(PackedValue::TensorMut(t)) => Ok(t.as_view()),
        Some(other) => Err(mismatch(index, TypeCode::TensorHandle, other)),
        None => Err(Status::ArgCount {
            expected: index + 1,
            actual: values.len(),
        }),
    }
}

fn mismatch(index: usize, expected: TypeCode, actual: &PackedValue<'_>) -> Status {
    Status::TypeMismatch {
        index,
        expected,
        actual: actual.type_code(),
    }
}
