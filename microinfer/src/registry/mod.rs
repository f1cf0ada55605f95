//! Operator registries and the module that exposes them.

mod function_registry;
mod module;
mod runtime;

pub use function_registry::{FuncHandle, FunctionRegistry};
pub use module::{Module, LINKED_PARAM_LOOKUP};
pub use runtime::{Runtime, MODULE_HAS_FUNCTION, SYSTEM_LIB};
