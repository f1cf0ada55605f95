//! Error types for the runtime.
//!
//! Structural errors (`UnresolvedOperator`, `Allocation`, `InvalidGraph`)
//! are only produced by `GraphExecutor::load` and leave the executor
//! uninitialized. Everything else is a per-call error and leaves the
//! executor usable.

use thiserror::Error;

use crate::packed::Status;
use crate::runtime::ExecutorState;
use crate::tensor::TensorShape;

#[derive(Debug, Error)]
pub enum Error {
    /// A function with this name is already registered.
    #[error("duplicate function name: {0}")]
    DuplicateName(String),

    /// No function with this name is registered.
    #[error("function not found: {0}")]
    NotFound(String),

    /// A packed call failed argument validation or returned a failure status.
    #[error("packed call failed: {0}")]
    Call(#[from] Status),

    /// The graph references an operator the module does not export.
    #[error("unresolved operator: {0}")]
    UnresolvedOperator(String),

    #[error("shape mismatch for {name}: expected {expected}, got {actual}")]
    ShapeMismatch {
        name: String,
        expected: TensorShape,
        actual: TensorShape,
    },

    #[error("unknown input: {0}")]
    UnknownInput(String),

    #[error("unknown output: {0}")]
    UnknownOutput(String),

    /// The arena could not be reserved or exceeds the configured limit.
    #[error("arena allocation of {requested} bytes failed: {reason}")]
    Allocation { requested: usize, reason: String },

    /// A kernel returned a failure status during `run`.
    #[error("kernel {operator} failed: {status}")]
    KernelExecution { operator: String, status: Status },

    #[error("invalid graph description: {0}")]
    InvalidGraph(String),

    #[error("cannot {operation} while executor is {state}")]
    InvalidState {
        operation: &'static str,
        state: ExecutorState,
    },

    #[error("graph json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_graph(msg: impl Into<String>) -> Self {
        Error::InvalidGraph(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
