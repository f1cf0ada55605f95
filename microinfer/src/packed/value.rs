use std::any::Any;
use std::fmt;

use crate::registry::Module;
use crate::tensor::{TensorDescriptor, TensorDescriptorMut};

/// Runtime type tag of a packed value. The numbering follows the C
/// packed-call ABI so tags can be logged and compared across boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum TypeCode {
    Int = 0,
    Float = 2,
    OpaqueHandle = 3,
    Null = 4,
    TensorHandle = 7,
    ModuleHandle = 9,
    Str = 11,
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeCode::Int => "int",
            TypeCode::Float => "float",
            TypeCode::OpaqueHandle => "handle",
            TypeCode::Null => "null",
            TypeCode::TensorHandle => "tensor",
            TypeCode::ModuleHandle => "module",
            TypeCode::Str => "str",
        };
        f.write_str(name)
    }
}

/// A single argument or return value of a packed call.
///
/// Handles (`Tensor`, `TensorMut`, `Module`, `Opaque`) are borrows. A callee
/// that returns a handle keeps ownership of whatever it points at.
#[derive(Debug)]
pub enum PackedValue<'a> {
    Null,
    Int(i64),
    Float(f64),
    Str(&'a str),
    Tensor(TensorDescriptor<'a>),
    TensorMut(TensorDescriptorMut<'a>),
    Module(&'a Module),
    Opaque(&'a (dyn Any + Send + Sync)),
}

impl<'a> PackedValue<'a> {
    pub fn type_code(&self) -> TypeCode {
        match self {
            PackedValue::Null => TypeCode::Null,
            PackedValue::Int(_) => TypeCode::Int,
            PackedValue::Float(_) => TypeCode::Float,
            PackedValue::Str(_) => TypeCode::Str,
            PackedValue::Tensor(_) | PackedValue::TensorMut(_) => TypeCode::TensorHandle,
            PackedValue::Module(_) => TypeCode::ModuleHandle,
            PackedValue::Opaque(_) => TypeCode::OpaqueHandle,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PackedValue::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PackedValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PackedValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            PackedValue::Str(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&'a Module> {
        match self {
            PackedValue::Module(m) => Some(*m),
            _ => None,
        }
    }

    /// Read-only view of a tensor handle, mutable or not.
    pub fn as_tensor(&self) -> Option<TensorDescriptor<'_>> {
        match self {
            PackedValue::Tensor(t) => Some(*t),
            PackedValue::TensorMut(t) => Some(t.as_view()),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&'a (dyn Any + Send + Sync)> {
        match self {
            PackedValue::Opaque(h) => Some(*h),
            _ => None,
        }
    }
}

impl From<i64> for PackedValue<'_> {
    fn from(value: i64) -> Self {
        PackedValue::Int(value)
    }
}

impl From<f64> for PackedValue<'_> {
    fn from(value: f64) -> Self {
        PackedValue::Float(value)
    }
}

impl<'a> From<&'a str> for PackedValue<'a> {
    fn from(value: &'a str) -> Self {
        PackedValue::Str(value)
    }
}

impl<'a> From<TensorDescriptor<'a>> for PackedValue<'a> {
    fn from(value: TensorDescriptor<'a>) -> Self {
        PackedValue::Tensor(value)
    }
}

impl<'a> From<TensorDescriptorMut<'a>> for PackedValue<'a> {
    fn from(value: TensorDescriptorMut<'a>) -> Self {
        PackedValue::TensorMut(value)
    }
}

impl<'a> From<&'a Module> for PackedValue<'a> {
    fn from(value: &'a Module) -> Self {
        PackedValue::Module(value)
    }
}
