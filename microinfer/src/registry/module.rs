use crate::error::{Error, Result};

use super::{FuncHandle, FunctionRegistry};

/// Name of the optional function a module exports to hand out constant
/// parameter data linked into the binary.
pub const LINKED_PARAM_LOOKUP: &str = "_lookup_linked_param";

/// Lookup-by-name over one or more chained registries.
///
/// A module is immutable once built. Applications build one system module
/// at startup and pass it to every executor they create.
#[derive(Debug, Clone, Default)]
pub struct Module {
    name: Option<String>,
    registries: Vec<FunctionRegistry>,
}

impl Module {
    pub fn new(registry: FunctionRegistry) -> Self {
        Self {
            name: None,
            registries: vec![registry],
        }
    }

    pub fn named(name: impl Into<String>, registry: FunctionRegistry) -> Self {
        Self {
            name: Some(name.into()),
            registries: vec![registry],
        }
    }

    /// Chain another registry behind the existing ones. A name exported by
    /// both would make lookups order-dependent, so it is rejected.
    pub fn import(&mut self, registry: FunctionRegistry) -> Result<()> {
        if let Some(name) = registry.names().find(|name| self.contains(name)) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        self.registries.push(registry);
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn lookup(&self, name: &str) -> Result<FuncHandle> {
        self.get_function(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn get_function(&self, name: &str) -> Option<FuncHandle> {
        self.registries
            .iter()
            .find_map(|registry| registry.get(name))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registries.iter().any(|registry| registry.contains(name))
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.registries.iter().flat_map(FunctionRegistry::names)
    }

    pub fn len(&self) -> usize {
        self.registries.iter().map(FunctionRegistry::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
