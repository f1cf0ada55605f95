//! Static graph description types.
//!
//! A description is produced ahead of time by the model compiler. It lists
//! every buffer the graph touches, the named input and output bindings, and
//! the operator calls in execution order.
use serde::{Deserialize, Serialize};

use crate::tensor::{DataType, TensorShape};

/// A tensor buffer the executor allocates in its arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferDecl {
    pub id: usize,
    pub dtype: DataType,
    pub shape: Vec<i64>,
    /// Buffers with the same storage id share arena memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<usize>,
    /// Constant contents, copied into the buffer at load time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
}

impl BufferDecl {
    pub fn tensor_shape(&self) -> TensorShape {
        TensorShape::new(self.dtype, self.shape.clone())
    }

    pub fn byte_size(&self) -> usize {
        self.checked_byte_size().unwrap_or(usize::MAX)
    }

    /// Byte size, or `None` when it does not fit in `usize`.
    pub fn checked_byte_size(&self) -> Option<usize> {
        crate::tensor::checked_numel(&self.shape)?.checked_mul(self.dtype.bytes())
    }

    pub fn is_constant(&self) -> bool {
        self.data.is_some()
    }
}

/// Binds an external input or output name to a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    pub buffer: usize,
}

/// One operator invocation: kernel name, input buffers, output buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpDecl {
    pub name: String,
    pub inputs: Vec<usize>,
    pub output: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    pub buffers: Vec<BufferDecl>,
    #[serde(default)]
    pub inputs: Vec<Binding>,
    #[serde(default)]
    pub outputs: Vec<Binding>,
    #[serde(default)]
    pub ops: Vec<OpDecl>,
}

impl GraphDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a buffer with its own storage and return its id.
    pub fn add_buffer(&mut self, dtype: DataType, shape: &[i64]) -> usize {
        let id = self.buffers.len();
        self.buffers.push(BufferDecl {
            id,
            dtype,
            shape: shape.to_vec(),
            storage_id: None,
            data: None,
        });
        id
    }

    /// Declare a buffer sharing arena memory with every other buffer of the
    /// same storage id.
    pub fn add_shared_buffer(
        &mut self,
        dtype: DataType,
        shape: &[i64],
        storage_id: usize,
    ) -> usize {
        let id = self.add_buffer(dtype, shape);
        self.buffers[id].storage_id = Some(storage_id);
        id
    }

    pub fn add_constant(
        &mut self,
        dtype: DataType,
        shape: &[i64],
        data: impl Into<Vec<u8>>,
    ) -> usize {
        let id = self.add_buffer(dtype, shape);
        self.buffers[id].data = Some(data.into());
        id
    }

    pub fn add_input(&mut self, name: impl Into<String>, buffer: usize) {
        self.inputs.push(Binding {
            name: name.into(),
            buffer,
        });
    }

    pub fn add_output(&mut self, name: impl Into<String>, buffer: usize) {
        self.outputs.push(Binding {
            name: name.into(),
            buffer,
        });
    }

    pub fn add_op(&mut self, name: impl Into<String>, inputs: &[usize], output: usize) {
        self.ops.push(OpDecl {
            name: name.into(),
            inputs: inputs.to_vec(),
            output,
        });
    }

    pub fn buffer(&self, id: usize) -> Option<&BufferDecl> {
        self.buffers.get(id)
    }
}

pub fn describe_op(op: &OpDecl) -> String {
    let inputs = op
        .inputs
        .iter()
        .map(|id| format!("%{}", id))
        .collect::<Vec<_>>()
        .join(",");
    format!("op {}({}) >> %{}", op.name, inputs, op.output)
}
