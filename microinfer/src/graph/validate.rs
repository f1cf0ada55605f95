use std::collections::HashSet;

use crate::error::{Error, Result};

use super::{Binding, GraphDescription};

/// Storage slot of `buffer`: its explicit storage id, or a private slot.
pub(crate) fn storage_key(graph: &GraphDescription, buffer: usize) -> StorageKey {
    match graph.buffers[buffer].storage_id {
        Some(sid) => StorageKey::Shared(sid),
        None => StorageKey::Private(buffer),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum StorageKey {
    Shared(usize),
    Private(usize),
}

impl GraphDescription {
    /// Check internal consistency. Provenance is not checked; the
    /// description is a trusted build artifact.
    pub fn validate(&self) -> Result<()> {
        for (idx, buffer) in self.buffers.iter().enumerate() {
            if buffer.id != idx {
                return Err(Error::invalid_graph(format!(
                    "buffer {} declared at position {}; ids must be dense and ordered",
                    buffer.id, idx
                )));
            }
            if buffer.shape.iter().any(|dim| *dim < 0) {
                return Err(Error::invalid_graph(format!(
                    "buffer {} has negative dims {:?}",
                    idx, buffer.shape
                )));
            }
            let byte_size = buffer.checked_byte_size().ok_or_else(|| {
                Error::invalid_graph(format!(
                    "buffer {} ({}) is too large to address",
                    idx,
                    buffer.tensor_shape()
                ))
            })?;
            if let Some(data) = &buffer.data {
                if data.len() != byte_size {
                    return Err(Error::invalid_graph(format!(
                        "constant buffer {} holds {} bytes, {} needs {}",
                        idx,
                        data.len(),
                        buffer.tensor_shape(),
                        byte_size
                    )));
                }
            }
        }

        self.validate_bindings(&self.inputs, "input")?;
        self.validate_bindings(&self.outputs, "output")?;

        let mut written = HashSet::new();
        for (idx, op) in self.ops.iter().enumerate() {
            if op.name.is_empty() {
                return Err(Error::invalid_graph(format!("op {} has no name", idx)));
            }
            self.check_buffer(op.output, || format!("output of op {} ({})", idx, op.name))?;
            let out_key = storage_key(self, op.output);
            for input in &op.inputs {
                self.check_buffer(*input, || format!("input of op {} ({})", idx, op.name))?;
                if storage_key(self, *input) == out_key {
                    return Err(Error::invalid_graph(format!(
                        "op {} ({}) writes buffer {} which aliases its input {}",
                        idx, op.name, op.output, input
                    )));
                }
            }
            written.insert(out_key);
        }

        // Inputs and constants must read the same on every run.
        if let Some(binding) = self
            .inputs
            .iter()
            .find(|b| written.contains(&storage_key(self, b.buffer)))
        {
            return Err(Error::invalid_graph(format!(
                "input {} is bound to buffer {} whose storage an op overwrites",
                binding.name, binding.buffer
            )));
        }
        if let Some(constant) = self
            .buffers
            .iter()
            .find(|b| b.is_constant() && written.contains(&storage_key(self, b.id)))
        {
            return Err(Error::invalid_graph(format!(
                "constant buffer {} lives in storage an op overwrites",
                constant.id
            )));
        }
        Ok(())
    }

    fn validate_bindings(&self, bindings: &[Binding], kind: &str) -> Result<()> {
        let mut names = HashSet::new();
        for binding in bindings {
            self.check_buffer(binding.buffer, || format!("{} {}", kind, binding.name))?;
            if !names.insert(binding.name.as_str()) {
                return Err(Error::invalid_graph(format!(
                    "duplicate {} name {}",
                    kind, binding.name
                )));
            }
        }
        Ok(())
    }

    fn check_buffer(&self, id: usize, what: impl FnOnce() -> String) -> Result<()> {
        if id >= self.buffers.len() {
            return Err(Error::invalid_graph(format!(
                "{} references undeclared buffer {}",
                what(),
                id
            )));
        }
        Ok(())
    }
}
