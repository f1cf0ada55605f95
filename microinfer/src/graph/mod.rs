mod compiler;
mod json;
mod types;
mod validate;

pub use json::{GraphDeserialize, GraphSerialize};
pub use types::{describe_op, Binding, BufferDecl, GraphDescription, OpDecl};

pub(crate) use validate::{storage_key, StorageKey};
